//! Cross-run elite memory: a size-bounded, deduplicated archive of the best
//! feasible designs ever found, persisted between runs.
//!
//! The archive is read once when the clustering phase starts and written
//! once when it ends. A dimensionality mismatch (config changed since the
//! archive was written) discards the whole archive; persistence failures
//! are logged and the run continues in memory only.

use std::fs;
use std::path::Path;

use crate::audit::ErrorLog;
use crate::config::SearchConfig;
use crate::fitness::FitnessHarness;
use crate::search::ops::is_unique;
use crate::space::DesignSpace;

pub const MEMORY_SORT_PHASE_LABEL: &str = "MemorySort";

#[derive(Debug, Clone, Default)]
pub struct EliteMemory {
    entries: Vec<Vec<f64>>,
}

impl EliteMemory {
    pub fn entries(&self) -> &[Vec<f64>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the persisted archive. Missing file yields empty memory. Any
    /// entry whose length differs from `num_vars` marks the archive as
    /// stale: it is discarded wholesale and the file removed.
    pub fn load(path: &str, num_vars: usize, errors: &ErrorLog) -> Self {
        let path_ref = Path::new(path);
        if !path_ref.exists() {
            return Self::default();
        }
        let raw = match fs::read_to_string(path_ref) {
            Ok(raw) => raw,
            Err(err) => {
                errors.log("memory", &format!("cannot read archive {path}: {err}"));
                return Self::default();
            }
        };
        let entries: Vec<Vec<f64>> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                errors.log("memory", &format!("archive {path} is corrupt, discarding: {err}"));
                let _ = fs::remove_file(path_ref);
                return Self::default();
            }
        };
        if entries.iter().any(|entry| entry.len() != num_vars) {
            errors.log(
                "memory",
                &format!(
                    "archive {path} has entries of the wrong dimensionality (expected {num_vars}), discarding"
                ),
            );
            let _ = fs::remove_file(path_ref);
            return Self::default();
        }
        Self { entries }
    }

    /// Fold this run's feasible elites into memory: keep only candidates
    /// that are diversity-unique against existing entries and each other,
    /// then re-evaluate everything (fitness is noisy), sort ascending, and
    /// truncate to the configured cap.
    pub fn absorb(
        &mut self,
        candidates: &[Vec<f64>],
        space: &DesignSpace,
        config: &SearchConfig,
        harness: &mut FitnessHarness<'_>,
    ) {
        for candidate in candidates {
            if is_unique(
                space,
                candidate,
                self.entries.iter(),
                config.diversity_threshold,
            ) {
                self.entries.push(candidate.clone());
            }
        }

        let mut rescored: Vec<(f64, Vec<f64>)> = self
            .entries
            .drain(..)
            .map(|entry| {
                let scored =
                    harness.score_one(MEMORY_SORT_PHASE_LABEL, &entry, config.penalty_scale);
                (scored.fitness(), entry)
            })
            .collect();
        rescored.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.entries = rescored
            .into_iter()
            .take(config.max_memory_size)
            .map(|(_, entry)| entry)
            .collect();
    }

    /// Write the archive. Failure is logged and swallowed: the run keeps
    /// its in-memory results.
    pub fn persist(&self, path: &str, errors: &ErrorLog) {
        let payload = match serde_json::to_string(&self.entries) {
            Ok(payload) => payload,
            Err(err) => {
                errors.log("memory", &format!("cannot serialize archive: {err}"));
                return;
            }
        };
        if let Err(err) = fs::write(path, payload) {
            errors.log("memory", &format!("cannot write archive {path}: {err}"));
        }
    }
}
