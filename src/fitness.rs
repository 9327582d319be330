//! Penalized fitness: collapse (mass, reserve factors) into one scalar that
//! ranks feasible and infeasible designs on the same scale, and the harness
//! that runs evaluations while keeping the audit log and progress counters
//! in evaluation order.

use rayon::prelude::*;

use crate::audit::{AuditLog, ErrorLog};
use crate::config::SearchConfig;
use crate::eval::{evaluate_with_retries, EvaluationResult, Evaluator, RetryPolicy};
use crate::parallel::WorkerPool;
use crate::progress::Progress;

/// Outcome of scoring one design.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessRecord {
    /// `raw_mass + penalty_scale * violation²`.
    pub penalized_fitness: f64,
    pub is_feasible: bool,
    pub violation_count: usize,
    pub raw_mass: f64,
    pub reserve_factors: Vec<f64>,
}

/// Derive a fitness record from an evaluation. Quadratic penalty: marginal
/// infeasibility is punished progressively harder as violation grows.
pub fn score(result: &EvaluationResult, threshold: f64, penalty_scale: f64) -> FitnessRecord {
    let total_violation: f64 = result
        .reserve_factors
        .iter()
        .map(|rf| (threshold - rf).max(0.0))
        .sum();
    let violation_count = result
        .reserve_factors
        .iter()
        .filter(|rf| **rf < threshold)
        .count();
    FitnessRecord {
        penalized_fitness: result.mass + penalty_scale * total_violation * total_violation,
        is_feasible: violation_count == 0,
        violation_count,
        raw_mass: result.mass,
        reserve_factors: result.reserve_factors.clone(),
    }
}

/// A design paired with its fitness record. Populations are sorted ascending
/// by penalized fitness.
#[derive(Debug, Clone)]
pub struct ScoredDesign {
    pub design: Vec<f64>,
    pub record: FitnessRecord,
}

impl ScoredDesign {
    pub fn fitness(&self) -> f64 {
        self.record.penalized_fitness
    }
}

/// Sort ascending by penalized fitness (best first).
pub fn sort_ascending(scored: &mut [ScoredDesign]) {
    scored.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
}

/// Runs evaluations for the search phases. Evaluations within one batch may
/// run in parallel; scoring, audit rows, call ids and progress increments
/// happen in a single sequential pass afterwards, so the audit log order
/// always matches evaluation order.
pub struct FitnessHarness<'a> {
    evaluator: &'a dyn Evaluator,
    errors: &'a ErrorLog,
    audit: Option<AuditLog>,
    pool: WorkerPool,
    policy: RetryPolicy,
    threshold: f64,
    pub progress: Progress,
    call_id: usize,
}

impl<'a> FitnessHarness<'a> {
    pub fn new(
        evaluator: &'a dyn Evaluator,
        config: &SearchConfig,
        errors: &'a ErrorLog,
        audit: Option<AuditLog>,
    ) -> Self {
        Self {
            evaluator,
            errors,
            audit,
            pool: WorkerPool::with_workers(config.workers),
            policy: RetryPolicy {
                fail_limit: config.fail_limit,
                expected_rf_count: config.expected_rf_count,
            },
            threshold: config.rf_threshold,
            progress: Progress::new(config.planned_calls()),
            call_id: 0,
        }
    }

    pub fn calls_done(&self) -> usize {
        self.progress.calls_done
    }

    /// Evaluate and score a whole batch under one phase label. `step` is the
    /// index within the batch.
    pub fn score_batch(
        &mut self,
        phase: &str,
        designs: &[Vec<f64>],
        penalty_scale: f64,
    ) -> Vec<ScoredDesign> {
        let evaluator = self.evaluator;
        let errors = self.errors;
        let policy = self.policy;
        let results: Vec<EvaluationResult> = self.pool.install(|| {
            designs
                .par_iter()
                .map(|design| evaluate_with_retries(evaluator, design, policy, errors))
                .collect()
        });

        designs
            .iter()
            .zip(results)
            .enumerate()
            .map(|(step, (design, result))| {
                let record = score(&result, self.threshold, penalty_scale);
                self.call_id += 1;
                self.progress.record_call();
                if let Some(audit) = self.audit.as_mut() {
                    if let Err(err) = audit.append(
                        phase,
                        step,
                        self.call_id,
                        record.raw_mass,
                        record.is_feasible,
                        record.violation_count,
                        design,
                        &record.reserve_factors,
                    ) {
                        errors.log("audit", &err);
                    }
                }
                ScoredDesign {
                    design: design.clone(),
                    record,
                }
            })
            .collect()
    }

    /// Single-design convenience used by the elite-memory re-sort.
    pub fn score_one(&mut self, phase: &str, design: &[f64], penalty_scale: f64) -> ScoredDesign {
        let batch = [design.to_vec()];
        self.score_batch(phase, &batch, penalty_scale)
            .pop()
            .unwrap_or_else(|| ScoredDesign {
                design: design.to_vec(),
                record: score(
                    &EvaluationResult::sentinel(self.policy.expected_rf_count),
                    self.threshold,
                    penalty_scale,
                ),
            })
    }
}
