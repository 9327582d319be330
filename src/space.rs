//! Bounded design space: per-variable inclusive ranges, clamping, and
//! normalization for diversity comparisons.

use serde::{Deserialize, Serialize};

/// Guard against zero-width bounds when normalizing.
const RANGE_EPSILON: f64 = 1e-12;

/// Inclusive range for one design variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarBound {
    pub low: f64,
    pub high: f64,
}

impl VarBound {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// The search domain: an ordered list of per-variable bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    bounds: Vec<VarBound>,
}

impl DesignSpace {
    pub fn new(bounds: Vec<VarBound>) -> Self {
        Self { bounds }
    }

    pub fn dims(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[VarBound] {
        &self.bounds
    }

    /// Clamp every component into its configured range, in place.
    pub fn clamp(&self, design: &mut [f64]) {
        for (value, bound) in design.iter_mut().zip(&self.bounds) {
            *value = value.clamp(bound.low, bound.high);
        }
    }

    /// Map a design into [0, 1]^N using the bounds. Degenerate bounds
    /// (high == low) map to 0 rather than dividing by zero.
    pub fn normalize(&self, design: &[f64]) -> Vec<f64> {
        design
            .iter()
            .zip(&self.bounds)
            .map(|(value, bound)| (value - bound.low) / (bound.range() + RANGE_EPSILON))
            .collect()
    }

    /// Euclidean distance between two designs in normalized space.
    pub fn normalized_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let na = self.normalize(a);
        let nb = self.normalize(b);
        na.iter()
            .zip(&nb)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}
