//! Black-box evaluator boundary: the contract a structural simulation must
//! satisfy, plus the retry-then-sentinel adapter that keeps a long run alive
//! when individual evaluations fail.

pub mod panel;

use std::fmt;

use crate::audit::ErrorLog;

/// One simulation outcome: total mass and the full reserve-factor vector.
/// Immutable once produced; the adapter guarantees the vector length matches
/// the configured expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub mass: f64,
    pub reserve_factors: Vec<f64>,
}

impl EvaluationResult {
    /// Worst-case substitute used after retries are exhausted: infinite mass
    /// and all-zero reserve factors, so the design ranks last and is judged
    /// fully infeasible.
    pub fn sentinel(rf_count: usize) -> Self {
        Self {
            mass: f64::INFINITY,
            reserve_factors: vec![0.0; rf_count],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.mass.is_infinite()
    }
}

/// Why a single evaluation attempt was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The backend itself failed (solver crash, I/O, bad license...).
    Backend(String),
    /// The backend returned the wrong number of reserve factors.
    RfCountMismatch { expected: usize, actual: usize },
    /// The backend returned a non-finite or negative mass.
    BadMass(f64),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "backend failure: {message}"),
            Self::RfCountMismatch { expected, actual } => {
                write!(f, "expected {expected} reserve factors, got {actual}")
            }
            Self::BadMass(mass) => write!(f, "invalid mass {mass}"),
        }
    }
}

/// A black-box structural evaluator. Implementations must be safe to call
/// from parallel workers; anything stateful needs interior synchronization.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, design: &[f64]) -> Result<EvaluationResult, EvalError>;
}

impl<F> Evaluator for F
where
    F: Fn(&[f64]) -> Result<EvaluationResult, EvalError> + Send + Sync,
{
    fn evaluate(&self, design: &[f64]) -> Result<EvaluationResult, EvalError> {
        self(design)
    }
}

/// Bounded-retry settings for the adapter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub fail_limit: usize,
    pub expected_rf_count: usize,
}

/// Call the evaluator up to `fail_limit` times, validating the contract on
/// every attempt. Each rejected attempt is logged with its cause. When all
/// attempts fail the worst-case sentinel is returned; the caller never sees
/// a backend error.
pub fn evaluate_with_retries(
    evaluator: &dyn Evaluator,
    design: &[f64],
    policy: RetryPolicy,
    errors: &ErrorLog,
) -> EvaluationResult {
    for attempt in 1..=policy.fail_limit.max(1) {
        let rejected = match evaluator.evaluate(design) {
            Ok(result) => {
                if result.reserve_factors.len() != policy.expected_rf_count {
                    EvalError::RfCountMismatch {
                        expected: policy.expected_rf_count,
                        actual: result.reserve_factors.len(),
                    }
                } else if !result.mass.is_finite() || result.mass < 0.0 {
                    EvalError::BadMass(result.mass)
                } else {
                    return result;
                }
            }
            Err(err) => err,
        };
        errors.log(
            "evaluator",
            &format!("attempt {attempt} rejected for design {design:?}: {rejected}"),
        );
    }
    EvaluationResult::sentinel(policy.expected_rf_count)
}
