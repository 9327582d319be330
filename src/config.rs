//! Search configuration: design-space bounds, evaluator contract, and all
//! phase sizing constants. Loaded from JSON; every tuned constant from the
//! reference runs is a default here, not hard-coded behavior.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::space::{DesignSpace, VarBound};

pub const DEFAULT_CONFIG_PATH: &str = "longeron.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-variable inclusive bounds. Defaults match the 3-variable panel
    /// problem: skin thickness, stringer thickness, stringer width (mm).
    pub bounds: Vec<VarBound>,
    /// Number of reserve factors the evaluator must return per call.
    /// A mismatch is treated as an evaluation failure at the boundary.
    pub expected_rf_count: usize,
    /// Feasibility requires every reserve factor >= this threshold.
    pub rf_threshold: f64,

    /// Phase 1: random designs drawn to characterize the space.
    pub samples: usize,
    /// Phase 2: number of k-means clusters / regional GAs.
    pub num_clusters: usize,
    pub gens_per_cluster: usize,
    pub pop_cluster: usize,
    pub elite_per_cluster: usize,
    /// Phase 3: ensemble count and per-ensemble sizing.
    pub ensembles: usize,
    pub refine_gens: usize,
    pub refine_pop: usize,

    pub mutation_rate: f64,
    /// Base quadratic-penalty scale; refinement adds `penalty_growth` per generation.
    pub penalty_scale: f64,
    pub penalty_growth: f64,
    /// Minimum normalized distance for two designs to count as distinct.
    pub diversity_threshold: f64,
    /// Elite-memory archive cap.
    pub max_memory_size: usize,
    /// Evaluator attempts before substituting the worst-case sentinel.
    pub fail_limit: usize,
    /// Worker threads for within-generation evaluation. 0 = all cores.
    pub workers: usize,

    pub memory_path: String,
    pub log_path: String,
    pub error_log_path: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bounds: vec![
                VarBound::new(0.1, 4.5),
                VarBound::new(0.1, 5.0),
                VarBound::new(0.1, 20.0),
            ],
            expected_rf_count: 255,
            rf_threshold: 1.01,
            samples: 1200,
            num_clusters: 6,
            gens_per_cluster: 12,
            pop_cluster: 20,
            elite_per_cluster: 2,
            ensembles: 3,
            refine_gens: 25,
            refine_pop: 30,
            mutation_rate: 0.25,
            penalty_scale: 1000.0,
            penalty_growth: 50.0,
            diversity_threshold: 0.05,
            max_memory_size: 20,
            fail_limit: 3,
            workers: 0,
            memory_path: "elite_memory.json".to_string(),
            log_path: "search_log.csv".to_string(),
            error_log_path: "search_errors.log".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn space(&self) -> DesignSpace {
        DesignSpace::new(self.bounds.clone())
    }

    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }

    /// Expected evaluator calls for the three phases. Memory re-sort calls
    /// come on top; the total is used for ETA display only.
    pub fn planned_calls(&self) -> usize {
        self.samples
            + self.num_clusters * self.gens_per_cluster * self.pop_cluster
            + self.ensembles * self.refine_gens * self.refine_pop
    }
}

/// Load configuration from a JSON file. A missing file yields the defaults;
/// an unreadable or malformed file is a setup error and is surfaced loudly.
pub fn load_config(path: &str) -> Result<SearchConfig, String> {
    let path_ref = Path::new(path);
    if !path_ref.exists() {
        return Ok(SearchConfig::default());
    }
    let raw =
        fs::read_to_string(path_ref).map_err(|err| format!("cannot read config {path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid config {path}: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    fn push(&mut self, severity: ValidationSeverity, context: &str, message: impl Into<String>) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.to_string(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Check a configuration for setup errors. Errors indicate a broken setup
/// (the run must not start); warnings flag suspicious but workable values.
pub fn validate_config(config: &SearchConfig) -> ValidationReport {
    use ValidationSeverity::{Error, Warning};
    let mut report = ValidationReport::default();

    if config.bounds.is_empty() {
        report.push(Error, "bounds", "no design variables configured");
    }
    for (i, bound) in config.bounds.iter().enumerate() {
        let context = format!("bounds[{i}]");
        if !bound.low.is_finite() || !bound.high.is_finite() {
            report.push(Error, &context, "bounds must be finite");
        } else if bound.low > bound.high {
            report.push(
                Error,
                &context,
                format!("low {} exceeds high {}", bound.low, bound.high),
            );
        } else if bound.low == bound.high {
            report.push(Warning, &context, "degenerate bound: variable is fixed");
        }
    }
    if config.expected_rf_count == 0 {
        report.push(Error, "expected_rf_count", "must be at least 1");
    }
    if !(config.rf_threshold > 0.0) {
        report.push(Error, "rf_threshold", "must be positive");
    }
    for (name, value) in [
        ("samples", config.samples),
        ("num_clusters", config.num_clusters),
        ("gens_per_cluster", config.gens_per_cluster),
        ("pop_cluster", config.pop_cluster),
        ("elite_per_cluster", config.elite_per_cluster),
        ("ensembles", config.ensembles),
        ("refine_gens", config.refine_gens),
        ("refine_pop", config.refine_pop),
        ("max_memory_size", config.max_memory_size),
        ("fail_limit", config.fail_limit),
    ] {
        if value == 0 {
            report.push(Error, name, "must be at least 1");
        }
    }
    if config.pop_cluster < 4 {
        report.push(Warning, "pop_cluster", "top-half parent pool will be tiny");
    }
    if !(0.0..=1.0).contains(&config.mutation_rate) {
        report.push(Error, "mutation_rate", "must lie in [0, 1]");
    }
    if config.penalty_scale <= 0.0 {
        report.push(Error, "penalty_scale", "must be positive");
    }
    if config.penalty_growth < 0.0 {
        report.push(Error, "penalty_growth", "must be non-negative");
    }
    if config.diversity_threshold <= 0.0 {
        report.push(Error, "diversity_threshold", "must be positive");
    }
    if config.samples < config.num_clusters {
        report.push(
            Error,
            "samples",
            "fewer samples than clusters; clustering cannot seed",
        );
    }

    report
}
