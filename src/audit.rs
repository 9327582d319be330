//! Durable run records: the CSV audit log (one row per evaluator call) and
//! the append-only error log.
//!
//! The audit log is the experiment record: phase label, step, call id, raw
//! mass, feasibility, violation count, the full design vector, and the full
//! reserve-factor vector. The header is written at run start, truncating any
//! previous log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;

/// Append-only CSV writer for evaluation records.
pub struct AuditLog {
    writer: csv::Writer<File>,
}

impl AuditLog {
    /// Create (truncate) the log and write the header row for `num_vars`
    /// design variables and `rf_count` reserve factors.
    pub fn create(path: &str, num_vars: usize, rf_count: usize) -> Result<Self, String> {
        let file =
            File::create(path).map_err(|err| format!("cannot create audit log {path}: {err}"))?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header: Vec<String> = vec![
            "phase".into(),
            "step".into(),
            "call_id".into(),
            "mass".into(),
            "feasible".into(),
            "violating_count".into(),
        ];
        header.extend((0..num_vars).map(|i| format!("x{i}")));
        header.extend((0..rf_count).map(|i| format!("RF_{i}")));
        writer
            .write_record(&header)
            .and_then(|()| writer.flush().map_err(Into::into))
            .map_err(|err| format!("cannot write audit header to {path}: {err}"))?;

        Ok(Self { writer })
    }

    /// Append one evaluation row. Row order matches evaluation order.
    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &mut self,
        phase: &str,
        step: usize,
        call_id: usize,
        mass: f64,
        feasible: bool,
        violating_count: usize,
        design: &[f64],
        reserve_factors: &[f64],
    ) -> Result<(), String> {
        let mut row: Vec<String> = vec![
            phase.to_string(),
            step.to_string(),
            call_id.to_string(),
            mass.to_string(),
            feasible.to_string(),
            violating_count.to_string(),
        ];
        row.extend(design.iter().map(|v| v.to_string()));
        row.extend(reserve_factors.iter().map(|v| v.to_string()));
        self.writer
            .write_record(&row)
            .and_then(|()| self.writer.flush().map_err(Into::into))
            .map_err(|err| format!("audit log write failed: {err}"))
    }
}

/// Timestamped error sink. Failures here never abort the run: if the file
/// cannot be opened or written, messages still reach stderr.
pub struct ErrorLog {
    file: Mutex<Option<File>>,
}

impl ErrorLog {
    pub fn open(path: &str) -> Self {
        // Truncate the previous run's errors, like the audit log.
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(Path::new(path))
            .ok();
        if file.is_none() {
            eprintln!("warning: cannot open error log {path}; errors go to stderr only");
        }
        Self {
            file: Mutex::new(file),
        }
    }

    /// Sink that only mirrors to stderr. Used by tests and library callers
    /// that do not want a file on disk.
    pub fn stderr_only() -> Self {
        Self {
            file: Mutex::new(None),
        }
    }

    pub fn log(&self, context: &str, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{stamp} [{context}] {message}");
        eprintln!("{line}");
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                // A failing error log must not take down the run.
                let _ = writeln!(file, "{line}");
            }
        }
    }
}
