//! Population operators: random generation, blend crossover, bounded
//! Gaussian mutation, and the diversity test used for elite deduplication.
//!
//! Every operator returns a fresh vector; parents are never mutated in
//! place, so selecting the same parent twice cannot alias.

use crate::rng::Rng;
use crate::space::DesignSpace;

/// Mutation noise sigma as a fraction of each variable's bound range.
const MUTATION_SIGMA_FRACTION: f64 = 0.1;

/// Uniform draw within every bound.
pub fn random_individual(space: &DesignSpace, rng: &mut Rng) -> Vec<f64> {
    space
        .bounds()
        .iter()
        .map(|bound| rng.uniform(bound.low, bound.high))
        .collect()
}

/// Blend crossover: one scalar coefficient for the whole vector,
/// `child = alpha * p1 + (1 - alpha) * p2`, clamped to bounds.
pub fn crossover(space: &DesignSpace, p1: &[f64], p2: &[f64], rng: &mut Rng) -> Vec<f64> {
    let alpha = rng.next_f64();
    let mut child: Vec<f64> = p1
        .iter()
        .zip(p2)
        .map(|(a, b)| alpha * a + (1.0 - alpha) * b)
        .collect();
    space.clamp(&mut child);
    child
}

/// Per-component Gaussian perturbation: each component moves with
/// probability `rate`, with sigma proportional to its bound range. The
/// result is clamped, so repeated mutation can never escape the bounds.
pub fn mutate(space: &DesignSpace, individual: &[f64], rate: f64, rng: &mut Rng) -> Vec<f64> {
    let mut child = individual.to_vec();
    for (value, bound) in child.iter_mut().zip(space.bounds()) {
        if rng.next_f64() < rate {
            *value += rng.normal(0.0, MUTATION_SIGMA_FRACTION * bound.range());
        }
    }
    space.clamp(&mut child);
    child
}

/// True iff the candidate keeps more than `diversity_threshold` normalized
/// Euclidean distance to every vector in `others`.
pub fn is_unique<'a, I>(
    space: &DesignSpace,
    candidate: &[f64],
    others: I,
    diversity_threshold: f64,
) -> bool
where
    I: IntoIterator<Item = &'a Vec<f64>>,
{
    others
        .into_iter()
        .all(|other| space.normalized_distance(candidate, other) > diversity_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::VarBound;

    fn space() -> DesignSpace {
        DesignSpace::new(vec![
            VarBound::new(0.1, 4.5),
            VarBound::new(0.1, 5.0),
            VarBound::new(0.1, 20.0),
        ])
    }

    #[test]
    fn random_individuals_respect_bounds() {
        let space = space();
        let mut rng = Rng::new(5);
        for _ in 0..500 {
            let individual = random_individual(&space, &mut rng);
            for (value, bound) in individual.iter().zip(space.bounds()) {
                assert!(*value >= bound.low && *value <= bound.high);
            }
        }
    }

    #[test]
    fn crossover_of_a_vector_with_itself_is_identity() {
        let space = space();
        let mut rng = Rng::new(5);
        let v = vec![1.0, 2.0, 3.0];
        for _ in 0..50 {
            let child = crossover(&space, &v, &v, &mut rng);
            for (c, p) in child.iter().zip(&v) {
                assert!((c - p).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn crossover_stays_between_parents_componentwise() {
        let space = space();
        let mut rng = Rng::new(9);
        let p1 = vec![0.5, 1.0, 2.0];
        let p2 = vec![4.0, 4.5, 18.0];
        for _ in 0..100 {
            let child = crossover(&space, &p1, &p2, &mut rng);
            for ((c, a), b) in child.iter().zip(&p1).zip(&p2) {
                assert!(*c >= a.min(*b) - 1e-12 && *c <= a.max(*b) + 1e-12);
            }
        }
    }

    #[test]
    fn repeated_mutation_never_leaves_bounds() {
        let space = space();
        let mut rng = Rng::new(13);
        let mut current = vec![2.0, 2.5, 10.0];
        for _ in 0..2_000 {
            current = mutate(&space, &current, 1.0, &mut rng);
            for (value, bound) in current.iter().zip(space.bounds()) {
                assert!(*value >= bound.low && *value <= bound.high);
            }
        }
    }

    #[test]
    fn mutation_with_zero_rate_is_identity() {
        let space = space();
        let mut rng = Rng::new(13);
        let v = vec![2.0, 2.5, 10.0];
        assert_eq!(mutate(&space, &v, 0.0, &mut rng), v);
    }

    #[test]
    fn uniqueness_tracks_the_diversity_threshold() {
        let space = space();
        let anchor = vec![2.0, 2.5, 10.0];
        let near = vec![2.001, 2.5, 10.0];
        let far = vec![4.0, 0.5, 1.0];
        let others = vec![anchor];
        assert!(!is_unique(&space, &near, &others, 0.05));
        assert!(is_unique(&space, &far, &others, 0.05));
    }

    #[test]
    fn uniqueness_against_nothing_is_true() {
        let space = space();
        assert!(is_unique(&space, &[1.0, 1.0, 1.0], &Vec::new(), 0.05));
    }
}
