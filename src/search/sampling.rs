//! Phase 1: global sampling. A large uniform draw over the whole design
//! space, evaluated once each, to characterize the feasible region before
//! any expensive local search is committed.

use crate::fitness::{FitnessHarness, ScoredDesign};
use crate::parallel::batch_ranges;
use crate::progress::Progress;
use crate::rng::Rng;
use crate::search::ops::random_individual;
use crate::space::DesignSpace;

/// Number of progress-reporting batches for the sampling draw.
const SAMPLING_PROGRESS_BATCH_COUNT: usize = 40;

pub const SAMPLING_PHASE_LABEL: &str = "Sampling";

#[derive(Debug, Clone)]
pub struct SamplingOutcome {
    /// Every evaluated (design, fitness) pair, in draw order.
    pub scored: Vec<ScoredDesign>,
    pub feasible_count: usize,
}

/// Draw and evaluate `samples` random designs. `on_progress(progress, done,
/// total)` fires after every batch.
pub fn run_sampling<F>(
    space: &DesignSpace,
    harness: &mut FitnessHarness<'_>,
    rng: &mut Rng,
    samples: usize,
    penalty_scale: f64,
    mut on_progress: F,
) -> SamplingOutcome
where
    F: FnMut(&Progress, usize, usize),
{
    let designs: Vec<Vec<f64>> = (0..samples)
        .map(|_| random_individual(space, rng))
        .collect();

    on_progress(&harness.progress, 0, samples);
    let mut scored = Vec::with_capacity(samples);
    for (start, end) in batch_ranges(samples, SAMPLING_PROGRESS_BATCH_COUNT) {
        scored.extend(harness.score_batch(SAMPLING_PHASE_LABEL, &designs[start..end], penalty_scale));
        on_progress(&harness.progress, end, samples);
    }

    let feasible_count = scored.iter().filter(|s| s.record.is_feasible).count();
    SamplingOutcome {
        scored,
        feasible_count,
    }
}
