//! Phase 2: regional search. The best-ranked samples are partitioned into
//! spatial clusters (k-means over raw design space) and an independent GA
//! runs inside each region, seeded at the cluster centroid.

use crate::config::SearchConfig;
use crate::fitness::{sort_ascending, FitnessHarness, ScoredDesign};
use crate::progress::Progress;
use crate::rng::Rng;
use crate::search::evolve::{evolve, GaParams};
use crate::search::ops::mutate;
use crate::search::sampling::SamplingOutcome;
use crate::space::DesignSpace;

/// Stop a cluster GA after this many consecutive generations whose best
/// fitness moved less than the epsilon.
const CLUSTER_STAGNATION_WINDOW: usize = 3;
const CLUSTER_STAGNATION_EPSILON: f64 = 1e-3;

/// K-means restarts and iteration cap.
const KMEANS_RESTARTS: usize = 10;
const KMEANS_MAX_ITERS: usize = 50;

/// Lloyd's algorithm with seeded restarts. Returns `k` centroids (fewer if
/// there are fewer points). Empty clusters keep their previous center.
pub fn kmeans(points: &[Vec<f64>], k: usize, rng: &mut Rng) -> Vec<Vec<f64>> {
    let k = k.min(points.len());
    if k == 0 {
        return Vec::new();
    }
    let dims = points[0].len();

    let mut best_centers: Vec<Vec<f64>> = Vec::new();
    let mut best_inertia = f64::INFINITY;

    for _ in 0..KMEANS_RESTARTS {
        let mut centers = init_centers(points, k, rng);
        let mut assignment = vec![0usize; points.len()];

        for _ in 0..KMEANS_MAX_ITERS {
            let mut changed = false;
            for (point_idx, point) in points.iter().enumerate() {
                let nearest = nearest_center(point, &centers);
                if assignment[point_idx] != nearest {
                    assignment[point_idx] = nearest;
                    changed = true;
                }
            }

            let mut sums = vec![vec![0.0; dims]; k];
            let mut counts = vec![0usize; k];
            for (point, &cluster) in points.iter().zip(&assignment) {
                counts[cluster] += 1;
                for (sum, value) in sums[cluster].iter_mut().zip(point) {
                    *sum += value;
                }
            }
            for (cluster, count) in counts.iter().enumerate() {
                if *count > 0 {
                    for value in sums[cluster].iter_mut() {
                        *value /= *count as f64;
                    }
                    centers[cluster] = sums[cluster].clone();
                }
            }

            if !changed {
                break;
            }
        }

        let inertia: f64 = points
            .iter()
            .zip(&assignment)
            .map(|(point, &cluster)| squared_distance(point, &centers[cluster]))
            .sum();
        if inertia < best_inertia {
            best_inertia = inertia;
            best_centers = centers;
        }
    }

    best_centers
}

/// Sample `k` distinct points as starting centers.
fn init_centers(points: &[Vec<f64>], k: usize, rng: &mut Rng) -> Vec<Vec<f64>> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    for swap_at in 0..k {
        let pick = swap_at + rng.index(indices.len() - swap_at);
        indices.swap(swap_at, pick);
    }
    indices[..k].iter().map(|&i| points[i].clone()).collect()
}

fn nearest_center(point: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (idx, center) in centers.iter().enumerate() {
        let dist = squared_distance(point, center);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Run the per-cluster GAs over the best-ranked samples. Returns the elite
/// harvest of every cluster, concatenated. `on_progress(progress, done,
/// total)` fires after each cluster finishes.
pub fn run_cluster_phase<F>(
    config: &SearchConfig,
    space: &DesignSpace,
    harness: &mut FitnessHarness<'_>,
    rng: &mut Rng,
    sampling: &SamplingOutcome,
    mut on_progress: F,
) -> Vec<ScoredDesign>
where
    F: FnMut(&Progress, usize, usize),
{
    let mut ranked = sampling.scored.clone();
    sort_ascending(&mut ranked);
    let subset_size = 100.max(config.num_clusters * 10).min(ranked.len());
    let seed_designs: Vec<Vec<f64>> = ranked[..subset_size]
        .iter()
        .map(|s| s.design.clone())
        .collect();

    let centers = kmeans(&seed_designs, config.num_clusters, rng);
    let params = GaParams {
        generations: config.gens_per_cluster,
        pop_size: config.pop_cluster,
        mutation_rate: config.mutation_rate,
        penalty_scale: config.penalty_scale,
        penalty_growth: 0.0,
        adaptive_child_mutation: false,
        stagnation_window: CLUSTER_STAGNATION_WINDOW,
        stagnation_epsilon: CLUSTER_STAGNATION_EPSILON,
    };

    let mut elites: Vec<ScoredDesign> = Vec::new();
    let total = centers.len();
    for (cluster_idx, center) in centers.iter().enumerate() {
        // Generation 0 scatters hard around the centroid (mutation rate 1).
        let initial: Vec<Vec<f64>> = (0..config.pop_cluster)
            .map(|_| mutate(space, center, 1.0, rng))
            .collect();

        let outcome = evolve(space, harness, rng, params, initial, |gen| {
            format!("Cluster{}_Gen{}", cluster_idx + 1, gen + 1)
        });

        elites.extend(
            outcome
                .final_ranked
                .into_iter()
                .take(config.elite_per_cluster),
        );
        on_progress(&harness.progress, cluster_idx + 1, total);
    }

    elites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ErrorLog;
    use crate::eval::EvaluationResult;
    use crate::search::sampling::run_sampling;
    use crate::space::VarBound;

    #[test]
    fn kmeans_separates_well_spaced_blobs() {
        let mut points = Vec::new();
        for i in 0..20 {
            points.push(vec![0.0 + 0.01 * i as f64, 0.0]);
            points.push(vec![10.0 + 0.01 * i as f64, 10.0]);
        }
        let mut rng = Rng::new(5);
        let centers = kmeans(&points, 2, &mut rng);
        assert_eq!(centers.len(), 2);
        let mut xs: Vec<f64> = centers.iter().map(|c| c[0]).collect();
        xs.sort_by(f64::total_cmp);
        assert!(xs[0] < 1.0, "low blob center at {}", xs[0]);
        assert!(xs[1] > 9.0, "high blob center at {}", xs[1]);
    }

    #[test]
    fn kmeans_caps_k_at_the_point_count() {
        let points = vec![vec![1.0], vec![2.0]];
        let mut rng = Rng::new(5);
        let centers = kmeans(&points, 6, &mut rng);
        assert_eq!(centers.len(), 2);
    }

    #[test]
    fn kmeans_of_nothing_is_empty() {
        let mut rng = Rng::new(5);
        assert!(kmeans(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn cluster_phase_harvests_elites_per_cluster() {
        let evaluator = |design: &[f64]| {
            Ok(EvaluationResult {
                mass: design[0],
                reserve_factors: vec![2.0 - 0.1 * design[0]],
            })
        };
        let config = SearchConfig {
            bounds: vec![VarBound::new(0.0, 10.0)],
            expected_rf_count: 1,
            rf_threshold: 1.0,
            samples: 60,
            num_clusters: 2,
            gens_per_cluster: 3,
            pop_cluster: 8,
            elite_per_cluster: 2,
            workers: 1,
            ..SearchConfig::default()
        };
        let errors = ErrorLog::stderr_only();
        let mut harness = FitnessHarness::new(&evaluator, &config, &errors, None);
        let mut rng = Rng::new(11);
        let space = config.space();

        let sampling =
            run_sampling(&space, &mut harness, &mut rng, config.samples, 1000.0, |_, _, _| {});
        let mut clusters_reported = 0usize;
        let elites = run_cluster_phase(
            &config,
            &space,
            &mut harness,
            &mut rng,
            &sampling,
            |_, done, total| {
                clusters_reported = done;
                assert_eq!(total, 2);
            },
        );

        assert_eq!(clusters_reported, 2);
        assert_eq!(elites.len(), 4);
        for elite in &elites {
            assert!(elite.design[0] >= 0.0 && elite.design[0] <= 10.0);
        }
    }
}
