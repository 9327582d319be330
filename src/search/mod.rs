//! The three-phase search engine: global sampling, clustered regional GAs,
//! and ensemble refinement, with a persistent elite memory bridging runs.

pub mod cluster;
pub mod evolve;
pub mod memory;
pub mod ops;
pub mod refine;
pub mod sampling;

use serde::Serialize;

use crate::audit::{AuditLog, ErrorLog};
use crate::config::{validate_config, SearchConfig};
use crate::eval::Evaluator;
use crate::fitness::FitnessHarness;
use crate::rng::Rng;
use crate::search::memory::EliteMemory;

/// One progress report to the caller, emitted as phases advance.
#[derive(Debug, Clone)]
pub struct PhaseUpdate {
    /// "sampling", "clusters", or "refinement".
    pub phase: &'static str,
    /// Units completed within the phase (samples, clusters, ensembles).
    pub done: usize,
    pub total: usize,
    /// Evaluator calls completed so far, across all phases.
    pub calls_done: usize,
    /// Remaining wall-clock estimate, `HH:MM:SS` or a placeholder.
    pub eta: String,
}

/// Final result of one run, serialized to the caller as-is.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Best feasible design found, if any. `None` means no design cleared
    /// every reserve-factor threshold.
    pub best_design: Option<Vec<f64>>,
    pub best_mass: Option<f64>,
    pub best_fitness: Option<f64>,
    pub feasible: bool,
    pub evaluator_calls: usize,
    /// Feasible fraction bookkeeping from the sampling phase.
    pub feasible_samples: usize,
    pub samples: usize,
    /// Elite-memory archive size after this run.
    pub memory_size: usize,
}

/// Run the whole search. The configuration is validated first; validation
/// errors abort before any evaluator call. `on_progress` receives updates as
/// sampling batches, clusters, and ensembles complete.
pub fn run_search<F>(
    config: &SearchConfig,
    evaluator: &dyn Evaluator,
    rng: &mut Rng,
    mut on_progress: F,
) -> Result<SearchOutcome, String>
where
    F: FnMut(&PhaseUpdate),
{
    let report = validate_config(config);
    if report.has_errors() {
        let joined: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
        return Err(format!("invalid configuration:\n{}", joined.join("\n")));
    }

    let errors = ErrorLog::open(&config.error_log_path);
    let audit = AuditLog::create(&config.log_path, config.num_vars(), config.expected_rf_count)?;
    let mut harness = FitnessHarness::new(evaluator, config, &errors, Some(audit));
    let space = config.space();

    let sampling = sampling::run_sampling(
        &space,
        &mut harness,
        rng,
        config.samples,
        config.penalty_scale,
        |progress, done, total| {
            on_progress(&PhaseUpdate {
                phase: "sampling",
                done,
                total,
                calls_done: progress.calls_done,
                eta: progress.eta(),
            });
        },
    );

    let cluster_elites = cluster::run_cluster_phase(
        config,
        &space,
        &mut harness,
        rng,
        &sampling,
        |progress, done, total| {
            on_progress(&PhaseUpdate {
                phase: "clusters",
                done,
                total,
                calls_done: progress.calls_done,
                eta: progress.eta(),
            });
        },
    );

    // Fold this run's feasible elites into the cross-run archive. The
    // archive is re-evaluated during absorb, so entries carried over from
    // earlier runs compete on fresh fitness.
    let mut memory = EliteMemory::load(&config.memory_path, config.num_vars(), &errors);
    let feasible_elites: Vec<Vec<f64>> = cluster_elites
        .iter()
        .filter(|s| s.record.is_feasible)
        .map(|s| s.design.clone())
        .collect();
    memory.absorb(&feasible_elites, &space, config, &mut harness);
    memory.persist(&config.memory_path, &errors);

    let pool = refine::build_refine_pool(config, &space, rng, &cluster_elites, &memory);
    let best = refine::run_refine_phase(
        config,
        &space,
        &mut harness,
        rng,
        &pool,
        |progress, done, total| {
            on_progress(&PhaseUpdate {
                phase: "refinement",
                done,
                total,
                calls_done: progress.calls_done,
                eta: progress.eta(),
            });
        },
    );

    Ok(SearchOutcome {
        best_design: best.as_ref().map(|s| s.design.clone()),
        best_mass: best.as_ref().map(|s| s.record.raw_mass),
        best_fitness: best.as_ref().map(|s| s.fitness()),
        feasible: best.is_some(),
        evaluator_calls: harness.calls_done(),
        feasible_samples: sampling.feasible_count,
        samples: config.samples,
        memory_size: memory.len(),
    })
}
