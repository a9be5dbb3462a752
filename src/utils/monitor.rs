#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct StageStats {
    pub stage: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    /// Time since the previous stage finished, or since the run started.
    pub stage_time: Duration,
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct Marks {
    last_stage_end: Instant,
    peak_memory_mb: u64,
    stages: Vec<StageStats>,
}

/// Samples process CPU and memory at the end of each training stage.
#[cfg(feature = "cli")]
pub struct ResourceMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    marks: Mutex<Marks>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl ResourceMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());
        if enabled {
            system.refresh_all();
        }
        let started = Instant::now();

        Self {
            system: Mutex::new(system),
            pid: sysinfo::get_current_pid().ok(),
            started,
            marks: Mutex::new(Marks {
                last_stage_end: started,
                peak_memory_mb: 0,
                stages: Vec::new(),
            }),
            enabled,
        }
    }

    /// Closes `stage` and returns its sample; `None` when disabled.
    pub fn mark(&self, stage: &str) -> Option<StageStats> {
        if !self.enabled {
            return None;
        }

        let (cpu_usage, memory_mb) = {
            let mut system = self.system.lock().ok()?;
            system.refresh_all();
            let process = system.process(self.pid?)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };

        let now = Instant::now();
        let mut marks = self.marks.lock().ok()?;
        marks.peak_memory_mb = marks.peak_memory_mb.max(memory_mb);
        let stats = StageStats {
            stage: stage.to_string(),
            cpu_usage,
            memory_mb,
            peak_memory_mb: marks.peak_memory_mb,
            stage_time: now.duration_since(marks.last_stage_end),
            total_time: now.duration_since(self.started),
        };
        marks.last_stage_end = now;
        marks.stages.push(stats.clone());
        Some(stats)
    }

    pub fn log_stage(&self, stage: &str) {
        if let Some(stats) = self.mark(stage) {
            tracing::info!(
                stage = %stats.stage,
                cpu = stats.cpu_usage,
                memory_mb = stats.memory_mb,
                peak_mb = stats.peak_memory_mb,
                stage_ms = stats.stage_time.as_millis() as u64,
                "📊 {} took {:?} (CPU {:.1}%, memory {}MB)",
                stats.stage,
                stats.stage_time,
                stats.cpu_usage,
                stats.memory_mb
            );
        }
    }

    pub fn log_final(&self) {
        if !self.enabled {
            return;
        }
        let Ok(marks) = self.marks.lock() else {
            return;
        };
        let slowest = marks.stages.iter().max_by_key(|s| s.stage_time);
        tracing::info!(
            stage = "training_pipeline",
            stages = marks.stages.len(),
            peak_mb = marks.peak_memory_mb,
            total_ms = self.started.elapsed().as_millis() as u64,
            slowest = slowest.map(|s| s.stage.as_str()).unwrap_or("-"),
            "📊 Training pipeline finished in {:?}, peak memory {}MB",
            self.started.elapsed(),
            marks.peak_memory_mb
        );
    }

    pub fn stages(&self) -> Vec<StageStats> {
        self.marks
            .lock()
            .map(|m| m.stages.clone())
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct ResourceMonitor;

#[cfg(not(feature = "cli"))]
impl ResourceMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stage(&self, _stage: &str) {}

    pub fn log_final(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
