//! Evaluation counters and time-to-completion estimation. Display only:
//! nothing in the search reads these to make control decisions.

use std::time::Instant;

/// Process-wide evaluation counters for one run.
#[derive(Debug, Clone)]
pub struct Progress {
    pub calls_done: usize,
    /// Planned calls across the three phases. Memory re-sort calls land on
    /// top, so `calls_done` may finish slightly above this.
    pub total_calls: usize,
    pub started: Instant,
}

impl Progress {
    pub fn new(total_calls: usize) -> Self {
        Self {
            calls_done: 0,
            total_calls,
            started: Instant::now(),
        }
    }

    pub fn record_call(&mut self) {
        self.calls_done += 1;
    }

    pub fn eta(&self) -> String {
        eta_str(self.started, self.calls_done, self.total_calls)
    }
}

/// Remaining time as `HH:MM:SS`, extrapolated from the average call rate so
/// far. Placeholder until the first call completes.
pub fn eta_str(started: Instant, done: usize, total: usize) -> String {
    if done == 0 || total <= done {
        return if done == 0 {
            "--:--:--".to_string()
        } else {
            "00:00:00".to_string()
        };
    }
    let elapsed = started.elapsed().as_secs_f64();
    let remain = (elapsed / done as f64) * (total - done) as f64;
    let secs = remain.round() as u64;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
