//! Phase 3: ensemble refinement. Several independent micro-GAs start from
//! the best cluster elites (plus a few lightly perturbed memory entries)
//! under a generation-increasing constraint penalty; the best feasible
//! result across ensembles is the engine's final answer.

use crate::config::SearchConfig;
use crate::fitness::{sort_ascending, FitnessHarness, ScoredDesign};
use crate::progress::Progress;
use crate::rng::Rng;
use crate::search::evolve::{evolve, GaParams};
use crate::search::memory::EliteMemory;
use crate::search::ops::{is_unique, mutate, random_individual};
use crate::space::DesignSpace;

/// Refinement runs a stricter stagnation rule than the cluster phase.
const REFINE_STAGNATION_WINDOW: usize = 5;
const REFINE_STAGNATION_EPSILON: f64 = 1e-4;

/// Memory entries injected into the pool get a light shake for fresh
/// exploration.
const MEMORY_SEED_MUTATION_RATE: f64 = 0.1;
const MAX_MEMORY_SEEDS: usize = 5;

/// Assemble the starting pool: ranked feasible cluster elites truncated to
/// the refine population, extended with up to five diversity-unique memory
/// entries. A run with no feasible elites falls back to the ranked elites
/// regardless of feasibility, and finally to random designs, so refinement
/// always has material to work with.
pub fn build_refine_pool(
    config: &SearchConfig,
    space: &DesignSpace,
    rng: &mut Rng,
    cluster_elites: &[ScoredDesign],
    memory: &EliteMemory,
) -> Vec<Vec<f64>> {
    let mut ranked = cluster_elites.to_vec();
    sort_ascending(&mut ranked);

    let mut pool: Vec<Vec<f64>> = ranked
        .iter()
        .filter(|s| s.record.is_feasible)
        .take(config.refine_pop)
        .map(|s| s.design.clone())
        .collect();
    if pool.is_empty() {
        pool = ranked
            .iter()
            .take(config.refine_pop)
            .map(|s| s.design.clone())
            .collect();
    }

    let mut memory_additions = 0usize;
    for entry in memory.entries() {
        if memory_additions >= MAX_MEMORY_SEEDS {
            break;
        }
        if is_unique(space, entry, pool.iter(), config.diversity_threshold) {
            pool.push(mutate(space, entry, MEMORY_SEED_MUTATION_RATE, rng));
            memory_additions += 1;
        }
    }

    while pool.is_empty() {
        pool.push(random_individual(space, rng));
    }
    pool.truncate(config.refine_pop);
    pool
}

/// Run the independent ensembles and return the best feasible individual
/// across them, or `None` when every ensemble came up empty.
/// `on_progress(progress, done, total)` fires after each ensemble.
pub fn run_refine_phase<F>(
    config: &SearchConfig,
    space: &DesignSpace,
    harness: &mut FitnessHarness<'_>,
    rng: &mut Rng,
    pool: &[Vec<f64>],
    mut on_progress: F,
) -> Option<ScoredDesign>
where
    F: FnMut(&Progress, usize, usize),
{
    let params = GaParams {
        generations: config.refine_gens,
        pop_size: config.refine_pop,
        mutation_rate: config.mutation_rate,
        penalty_scale: config.penalty_scale,
        penalty_growth: config.penalty_growth,
        adaptive_child_mutation: true,
        stagnation_window: REFINE_STAGNATION_WINDOW,
        stagnation_epsilon: REFINE_STAGNATION_EPSILON,
    };

    let mut best: Option<ScoredDesign> = None;
    for ensemble in 0..config.ensembles {
        let outcome = evolve(space, harness, rng, params, pool.to_vec(), |gen| {
            format!("Ensemble{}_Gen{}", ensemble + 1, gen + 1)
        });
        if let Some(candidate) = outcome.best_feasible {
            let improves = best
                .as_ref()
                .map(|current| candidate.fitness() < current.fitness())
                .unwrap_or(true);
            if improves {
                best = Some(candidate);
            }
        }
        on_progress(&harness.progress, ensemble + 1, config.ensembles);
    }
    best
}
