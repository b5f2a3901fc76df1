use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Resource usage of the process when an evaluation phase ended.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSample {
    pub phase: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub elapsed: Duration,
}

/// Everything a monitor saw over one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub phases: Vec<PhaseSample>,
    pub peak_memory_mb: u64,
    pub total_time: Duration,
}

/// Samples process memory and CPU at phase boundaries of a run.
///
/// Peak memory is dominated by the `kbs` stacked copies evaluated in one
/// forward pass, so this is what to watch when choosing `--kbs`.
pub struct SystemMonitor {
    #[cfg(feature = "cli")]
    system: System,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
    started: Instant,
    peak_memory_mb: u64,
    phases: Vec<PhaseSample>,
    enabled: bool,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            #[cfg(feature = "cli")]
            system: System::new(),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
            started: Instant::now(),
            peak_memory_mb: 0,
            phases: Vec::new(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn sample(&mut self) -> Option<(f32, u64)> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = self.system.process(pid)?;
        Some((process.cpu_usage(), process.memory() / 1024 / 1024))
    }

    #[cfg(not(feature = "cli"))]
    fn sample(&mut self) -> Option<(f32, u64)> {
        None
    }

    /// Records and logs the end of `phase`. No-op when disabled.
    pub fn record(&mut self, phase: &str) {
        if !self.enabled {
            return;
        }
        let Some((cpu_usage, memory_mb)) = self.sample() else {
            tracing::debug!("No process stats available for phase '{}'", phase);
            return;
        };
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

        let sample = PhaseSample {
            phase: phase.to_string(),
            cpu_usage,
            memory_mb,
            elapsed: self.started.elapsed(),
        };
        tracing::info!(
            "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
            sample.phase,
            sample.cpu_usage,
            sample.memory_mb,
            self.peak_memory_mb,
            sample.elapsed
        );
        self.phases.push(sample);
    }

    /// Logs the run totals and hands back what was recorded.
    pub fn finish(&mut self) -> Option<MonitorReport> {
        if !self.enabled {
            return None;
        }
        let report = MonitorReport {
            phases: std::mem::take(&mut self.phases),
            peak_memory_mb: self.peak_memory_mb,
            total_time: self.started.elapsed(),
        };
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB over {} phases",
            report.total_time,
            report.peak_memory_mb,
            report.phases.len()
        );
        Some(report)
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let mut monitor = SystemMonitor::default();
        assert!(!monitor.is_enabled());
        monitor.record("evaluate");
        assert!(monitor.finish().is_none());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_enabled_monitor_tracks_peak_over_phases() {
        let mut monitor = SystemMonitor::new(true);
        monitor.record("start");
        let _buffer = vec![0u8; 8 * 1024 * 1024];
        monitor.record("evaluate");

        let report = monitor.finish().unwrap();
        assert_eq!(report.phases.len(), 2);
        assert_eq!(report.phases[1].phase, "evaluate");
        assert!(report
            .phases
            .iter()
            .all(|p| p.memory_mb <= report.peak_memory_mb));
        assert!(report.phases[0].elapsed <= report.phases[1].elapsed);
    }
}
