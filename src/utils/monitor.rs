use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::atomic::AtomicU64;
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub requests: usize,
    pub failed_requests: usize,
    pub rows: usize,
    pub memory_usage_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
    pub elapsed_time: Duration,
}

/// Counts requests and rows over the lifetime of an engine.
/// With the `cli` feature it also samples the process's resident memory.
pub struct SessionMonitor {
    enabled: bool,
    start_time: Instant,
    requests: AtomicUsize,
    failed_requests: AtomicUsize,
    rows: AtomicUsize,
    #[cfg(feature = "cli")]
    process: Option<ProcessProbe>,
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: Mutex<System>,
    pid: Pid,
    peak_memory_mb: AtomicU64,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        Some(Self {
            system: Mutex::new(System::new()),
            pid,
            peak_memory_mb: AtomicU64::new(0),
        })
    }

    fn sample(&self) -> Option<(u64, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let memory_mb = system.process(self.pid)?.memory() / 1024 / 1024;
        let peak = self
            .peak_memory_mb
            .fetch_max(memory_mb, Ordering::Relaxed)
            .max(memory_mb);
        Some((memory_mb, peak))
    }
}

impl SessionMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            start_time: Instant::now(),
            requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
            #[cfg(feature = "cli")]
            process: if enabled { ProcessProbe::new() } else { None },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_success(&self, rows: usize) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> SessionStats {
        #[cfg(feature = "cli")]
        let memory = self.process.as_ref().and_then(ProcessProbe::sample);
        #[cfg(not(feature = "cli"))]
        let memory: Option<(u64, u64)> = None;

        SessionStats {
            requests: self.requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
            memory_usage_mb: memory.map(|(current, _)| current),
            peak_memory_mb: memory.map(|(_, peak)| peak),
            elapsed_time: self.start_time.elapsed(),
        }
    }

    pub fn log_stats(&self, phase: &str) {
        if !self.enabled {
            return;
        }
        let stats = self.get_stats();
        tracing::info!(
            phase,
            requests = stats.requests,
            rows = stats.rows,
            memory_mb = stats.memory_usage_mb,
            elapsed_ms = stats.elapsed_time.as_millis() as u64,
            "session stats"
        );
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let stats = self.get_stats();
        tracing::info!(
            requests = stats.requests,
            failed = stats.failed_requests,
            rows = stats.rows,
            peak_memory_mb = stats.peak_memory_mb,
            elapsed = ?stats.elapsed_time,
            "final session stats"
        );
    }
}

impl Default for SessionMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
