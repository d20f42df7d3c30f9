use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use nix::sys::statvfs::statvfs;
use procfs::{Current, CurrentSI, KernelStats, Meminfo};
use serde::Serialize;

use crate::manager::monitoring;
use crate::process::Process;

/// System-wide utilization percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub disk_percent: Option<f32>, // None when the filesystem could not be read
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryConsumer {
    pub pid: u32,
    pub name: String,
    pub memory_percent: f32,
}

/// Everything one sampler period produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerTick {
    pub sample: ResourceSample,
    pub top_memory: Vec<MemoryConsumer>,
    pub ram_alert: bool,
}

// Busy/total jiffies from the aggregate cpu line of /proc/stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounters {
    pub busy: u64,
    pub total: u64,
}

impl CpuCounters {
    pub fn read() -> Result<Self, String> {
        let stats = KernelStats::current()
            .map_err(|e| format!("Failed to read /proc/stat: {}", e))?;
        let t = stats.total;
        let idle = t.idle + t.iowait.unwrap_or(0);
        let busy = t.user
            + t.nice
            + t.system
            + t.irq.unwrap_or(0)
            + t.softirq.unwrap_or(0)
            + t.steal.unwrap_or(0);
        Ok(CpuCounters {
            busy,
            total: busy + idle,
        })
    }

    /// Utilization between two readings, 0 when no time has elapsed.
    pub fn percent_since(&self, earlier: &CpuCounters) -> f32 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        (busy as f64 / total as f64 * 100.0) as f32
    }
}

pub fn ram_percent() -> Result<f32, String> {
    let info = Meminfo::current().map_err(|e| format!("Failed to read /proc/meminfo: {}", e))?;
    // MemAvailable is missing on very old kernels
    let available = info
        .mem_available
        .unwrap_or(info.mem_free + info.buffers + info.cached);
    Ok(used_percent(info.mem_total.saturating_sub(available), available))
}

pub fn disk_percent(path: &str) -> Result<f32, String> {
    let stat = statvfs(path).map_err(|e| format!("Failed to statvfs {}: {}", path, e))?;
    let frsize = stat.fragment_size() as u64;
    let used = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64) * frsize;
    let available = stat.blocks_available() as u64 * frsize;
    Ok(used_percent(used, available))
}

fn used_percent(used: u64, available: u64) -> f32 {
    let total = used + available;
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

/// Top `n` processes by memory share, largest first. Processes using nothing are skipped.
pub fn top_memory_consumers(processes: &[&Process], n: usize) -> Vec<MemoryConsumer> {
    let mut ranked: Vec<MemoryConsumer> = processes
        .iter()
        .filter(|p| !p.name.is_empty() && p.pcb_data.memory_percent > 0.0)
        .map(|p| MemoryConsumer {
            pid: p.process_id,
            name: p.name.clone(),
            memory_percent: p.pcb_data.memory_percent,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.memory_percent
            .total_cmp(&a.memory_percent)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    ranked.truncate(n);
    ranked
}

/// High-RAM alert that fires once per excursion above the threshold.
#[derive(Debug, Clone)]
pub struct RamAlert {
    pub threshold: f32,
    shown: bool,
}

impl RamAlert {
    pub fn new(threshold: f32) -> Self {
        RamAlert {
            threshold,
            shown: false,
        }
    }

    /// Returns true only on the sample that crosses above the threshold.
    pub fn observe(&mut self, ram_percent: f32) -> bool {
        if ram_percent > self.threshold {
            if self.shown {
                return false;
            }
            self.shown = true;
            true
        } else {
            self.shown = false;
            false
        }
    }
}

/// Periodic resource sampler. Owns all of its state; nothing is shared with
/// simulation runs.
pub struct Sampler {
    pub interval: Duration,
    pub top_n: usize,
    pub disk_path: String,
    alert: RamAlert,
    processes: HashMap<u32, Process>,
}

impl Sampler {
    pub fn new(interval: Duration, top_n: usize, ram_alert_percent: f32) -> Self {
        Sampler {
            interval,
            top_n,
            disk_path: "/".to_string(),
            alert: RamAlert::new(ram_alert_percent),
            processes: HashMap::new(),
        }
    }

    /// Takes one sample. CPU utilization is measured across one `interval`.
    pub fn sample_once(&mut self) -> Result<SamplerTick, String> {
        let before = CpuCounters::read()?;
        std::thread::sleep(self.interval);
        let after = CpuCounters::read()?;

        let sample = ResourceSample {
            cpu_percent: after.percent_since(&before),
            ram_percent: ram_percent()?,
            disk_percent: match disk_percent(&self.disk_path) {
                Ok(percent) => Some(percent),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
        };

        monitoring::refresh_processes(&mut self.processes)?;
        let snapshot: Vec<&Process> = self.processes.values().collect();
        let top_memory = top_memory_consumers(&snapshot, self.top_n);
        let ram_alert = self.alert.observe(sample.ram_percent);

        debug!(
            "sample cpu={:.1}% ram={:.1}% disk={:?} alert={}",
            sample.cpu_percent, sample.ram_percent, sample.disk_percent, ram_alert
        );

        Ok(SamplerTick {
            sample,
            top_memory,
            ram_alert,
        })
    }

    /// Samples repeatedly, `count` times or forever when `None`.
    pub fn run<F>(&mut self, count: Option<usize>, mut on_tick: F) -> Result<(), String>
    where
        F: FnMut(&SamplerTick),
    {
        let mut taken = 0;
        while count.map_or(true, |c| taken < c) {
            let tick = self.sample_once()?;
            on_tick(&tick);
            taken += 1;
        }
        Ok(())
    }
}
