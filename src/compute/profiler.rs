//! Call-count and timing profiler for objectives and agents.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Aggregate statistics for one profiled function.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FunctionStats {
    pub calls: u64,
    pub total: Duration,
}

impl FunctionStats {
    /// Mean time per call in seconds.
    pub fn avg_seconds(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total.as_secs_f64() / self.calls as f64
        }
    }
}

#[derive(Debug, Default)]
struct ProfilerState {
    functions: BTreeMap<String, FunctionStats>,
    started: Option<Instant>,
    stopped: Option<Instant>,
}

/// Thread-safe profiler. Share it with `Arc` between the closures it wraps.
#[derive(Debug, Default)]
pub struct Profiler {
    state: Mutex<ProfilerState>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProfilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the overall timer.
    pub fn start(&self) {
        let mut state = self.lock();
        state.started = Some(Instant::now());
        state.stopped = None;
        log::info!("Profiling started");
    }

    /// Stop the overall timer.
    pub fn stop(&self) {
        self.lock().stopped = Some(Instant::now());
        log::info!(
            "Profiling stopped. Total time: {:.2} seconds",
            self.total_seconds()
        );
    }

    /// Seconds between `start` and `stop`; zero unless both were called.
    pub fn total_seconds(&self) -> f64 {
        let state = self.lock();
        match (state.started, state.stopped) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start).as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Run `f`, recording one call and its duration under `name`.
    pub fn measure<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Record one call of `name` that took `elapsed`.
    pub fn record(&self, name: &str, elapsed: Duration) {
        let mut state = self.lock();
        let entry = state.functions.entry(name.to_string()).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }

    /// Statistics for one function.
    pub fn get(&self, name: &str) -> Option<FunctionStats> {
        self.lock().functions.get(name).copied()
    }

    /// Statistics for every function, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, FunctionStats)> {
        self.lock()
            .functions
            .iter()
            .map(|(n, s)| (n.clone(), *s))
            .collect()
    }

    /// Fixed-width text report.
    pub fn report_string(&self) -> String {
        let mut lines = vec![
            format!("Total execution time: {:.2} seconds", self.total_seconds()),
            String::new(),
            format!(
                "{:<25} {:<10} {:<12} {:<12}",
                "Function", "Calls", "Total Time", "Avg Time"
            ),
        ];
        for (name, stats) in self.snapshot() {
            lines.push(format!(
                "{:<25} {:<10} {:<12.4} {:<12.6}",
                name,
                stats.calls,
                stats.total.as_secs_f64(),
                stats.avg_seconds()
            ));
        }
        lines.join("\n")
    }

    /// Write the report to `path`.
    pub fn save_report<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.report_string())
    }
}
