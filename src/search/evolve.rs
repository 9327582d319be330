//! The generational loop shared by the regional (cluster) and refinement
//! GAs: evaluate, sort, keep the single best, breed from the top half, stop
//! early on stagnation.

use crate::fitness::{sort_ascending, FitnessHarness, ScoredDesign};
use crate::rng::Rng;
use crate::search::ops::{crossover, mutate};
use crate::space::DesignSpace;

/// Parameterization of one GA run. The cluster phase uses a flat penalty
/// and a flat mutation rate; refinement grows the penalty per generation
/// and mutates later-bred children harder.
#[derive(Debug, Clone, Copy)]
pub struct GaParams {
    pub generations: usize,
    pub pop_size: usize,
    pub mutation_rate: f64,
    pub penalty_scale: f64,
    /// Added to `penalty_scale` once per generation.
    pub penalty_growth: f64,
    /// Child at index i mutates at `mutation_rate * i / pop_size` when set.
    pub adaptive_child_mutation: bool,
    /// Consecutive generations within `stagnation_epsilon` before stopping.
    pub stagnation_window: usize,
    pub stagnation_epsilon: f64,
}

#[derive(Debug, Clone)]
pub struct EvolveOutcome {
    /// Final generation, sorted ascending by penalized fitness.
    pub final_ranked: Vec<ScoredDesign>,
    /// Best feasible individual seen across all generations.
    pub best_feasible: Option<ScoredDesign>,
    pub generations_run: usize,
}

/// Run the generational loop from `initial` until the generation budget or
/// the stagnation window is exhausted. `phase_label` names each generation
/// for the audit log.
pub fn evolve<L>(
    space: &DesignSpace,
    harness: &mut FitnessHarness<'_>,
    rng: &mut Rng,
    params: GaParams,
    initial: Vec<Vec<f64>>,
    mut phase_label: L,
) -> EvolveOutcome
where
    L: FnMut(usize) -> String,
{
    let mut population = initial;
    let mut best_feasible: Option<ScoredDesign> = None;
    let mut last_best = f64::INFINITY;
    let mut stagnant = 0usize;
    let mut final_ranked: Vec<ScoredDesign> = Vec::new();
    let mut generations_run = 0usize;

    for gen in 0..params.generations {
        let penalty = params.penalty_scale + params.penalty_growth * gen as f64;
        let mut scored = harness.score_batch(&phase_label(gen), &population, penalty);
        sort_ascending(&mut scored);
        generations_run = gen + 1;

        for candidate in scored.iter().filter(|s| s.record.is_feasible) {
            let improves = best_feasible
                .as_ref()
                .map(|best| candidate.fitness() < best.fitness())
                .unwrap_or(true);
            if improves {
                best_feasible = Some(candidate.clone());
            }
        }

        let gen_best = scored[0].fitness();
        if (gen_best - last_best).abs() < params.stagnation_epsilon {
            stagnant += 1;
        } else {
            stagnant = 0;
        }
        last_best = gen_best;

        final_ranked = scored;
        if stagnant >= params.stagnation_window {
            break;
        }
        if gen + 1 == params.generations {
            break;
        }

        population = breed(space, rng, &params, &final_ranked);
    }

    EvolveOutcome {
        final_ranked,
        best_feasible,
        generations_run,
    }
}

/// Next generation: elitism of one, then children crossed from distinct
/// parent pairs drawn from the top half of the ranked population.
fn breed(
    space: &DesignSpace,
    rng: &mut Rng,
    params: &GaParams,
    ranked: &[ScoredDesign],
) -> Vec<Vec<f64>> {
    let mut next = Vec::with_capacity(params.pop_size);
    next.push(ranked[0].design.clone());

    let parents: Vec<&Vec<f64>> = ranked
        .iter()
        .take((ranked.len() / 2).max(2).min(ranked.len()))
        .map(|s| &s.design)
        .collect();

    while next.len() < params.pop_size {
        let child = if parents.len() < 2 {
            // Population too small to pair; perturb the best instead.
            ranked[0].design.clone()
        } else {
            let (i, j) = rng.distinct_pair(parents.len());
            crossover(space, parents[i], parents[j], rng)
        };
        let rate = if params.adaptive_child_mutation {
            params.mutation_rate * next.len() as f64 / params.pop_size as f64
        } else {
            params.mutation_rate
        };
        next.push(mutate(space, &child, rate, rng));
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ErrorLog;
    use crate::config::SearchConfig;
    use crate::eval::EvaluationResult;
    use crate::space::VarBound;

    fn one_var_config() -> SearchConfig {
        SearchConfig {
            bounds: vec![VarBound::new(0.0, 10.0)],
            expected_rf_count: 1,
            rf_threshold: 1.0,
            workers: 1,
            ..SearchConfig::default()
        }
    }

    fn params(generations: usize) -> GaParams {
        GaParams {
            generations,
            pop_size: 10,
            mutation_rate: 0.25,
            penalty_scale: 1000.0,
            penalty_growth: 0.0,
            adaptive_child_mutation: false,
            stagnation_window: 3,
            stagnation_epsilon: 1e-3,
        }
    }

    #[test]
    fn stagnation_stops_evolution_before_the_budget() {
        // Constant fitness everywhere: best never changes.
        let evaluator = |_design: &[f64]| {
            Ok(EvaluationResult {
                mass: 5.0,
                reserve_factors: vec![2.0],
            })
        };
        let config = one_var_config();
        let errors = ErrorLog::stderr_only();
        let mut harness = FitnessHarness::new(&evaluator, &config, &errors, None);
        let mut rng = Rng::new(3);
        let space = config.space();

        let initial: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let outcome = evolve(&space, &mut harness, &mut rng, params(50), initial, |g| {
            format!("Test_Gen{}", g + 1)
        });

        // First generation sets the baseline; three stagnant follow-ups stop it.
        assert_eq!(outcome.generations_run, 4);
        assert!(outcome.generations_run < 50);
    }

    #[test]
    fn improving_fitness_resets_the_stagnation_counter() {
        let evaluator = |design: &[f64]| {
            Ok(EvaluationResult {
                mass: design[0],
                reserve_factors: vec![2.0],
            })
        };
        let config = one_var_config();
        let errors = ErrorLog::stderr_only();
        let mut harness = FitnessHarness::new(&evaluator, &config, &errors, None);
        let mut rng = Rng::new(17);
        let space = config.space();

        let initial: Vec<Vec<f64>> = (0..10).map(|i| vec![5.0 + 0.4 * i as f64]).collect();
        let outcome = evolve(&space, &mut harness, &mut rng, params(20), initial, |g| {
            format!("Test_Gen{}", g + 1)
        });

        let best = outcome.best_feasible.expect("feasible best");
        // Mass equals x; selection pressure should push well below the seeds.
        assert!(best.record.raw_mass < 5.0, "mass {}", best.record.raw_mass);
        assert!(best.record.is_feasible);
    }

    #[test]
    fn final_generation_is_sorted_ascending() {
        let evaluator = |design: &[f64]| {
            Ok(EvaluationResult {
                mass: design[0],
                reserve_factors: vec![2.0],
            })
        };
        let config = one_var_config();
        let errors = ErrorLog::stderr_only();
        let mut harness = FitnessHarness::new(&evaluator, &config, &errors, None);
        let mut rng = Rng::new(29);
        let space = config.space();

        let initial: Vec<Vec<f64>> = (0..10).map(|i| vec![(10 - i) as f64 * 0.9]).collect();
        let outcome = evolve(&space, &mut harness, &mut rng, params(2), initial, |g| {
            format!("Test_Gen{}", g + 1)
        });

        let fits: Vec<f64> = outcome.final_ranked.iter().map(|s| s.fitness()).collect();
        for pair in fits.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn infeasible_individuals_never_become_best_feasible() {
        let evaluator = |design: &[f64]| {
            Ok(EvaluationResult {
                mass: design[0],
                reserve_factors: vec![0.5],
            })
        };
        let config = one_var_config();
        let errors = ErrorLog::stderr_only();
        let mut harness = FitnessHarness::new(&evaluator, &config, &errors, None);
        let mut rng = Rng::new(31);
        let space = config.space();

        let initial: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let outcome = evolve(&space, &mut harness, &mut rng, params(3), initial, |g| {
            format!("Test_Gen{}", g + 1)
        });
        assert!(outcome.best_feasible.is_none());
    }
}
