
use procfs::{
    process::Process as ProcfsProcess,
    ProcError,
};
use std::collections::HashSet;
use std::convert::TryFrom;
use std::path::PathBuf;

pub mod pcb;

use pcb::PcbData;


// Main Process Data Structure

/// Represents a single process on the system.
#[derive(Debug, Clone)]
pub struct Process {
    pub process_id: u32,
    pub user_id: u32,
    pub name: String,
    pub parent_id: Option<u32>,
    pub executable_path: Option<PathBuf>, // None when /proc/[pid]/exe is unreadable (kernel threads, other users)
    pub pcb_data: PcbData,
}


// Implementation

impl TryFrom<u32> for Process {
    type Error = ProcError;

    fn try_from(pid: u32) -> Result<Self, Self::Error> {
        let procfs_proc = ProcfsProcess::new(pid as i32)?;
        let stat = procfs_proc.stat()?;
        let status = procfs_proc.status()?;
        let page_size: u64 = procfs::page_size();
        let memory_rss_kb = (stat.rss as u64 * page_size) / 1024;

        Ok(Process {
            process_id: pid,
            user_id: status.ruid,
            name: stat.comm,
            parent_id: Some(stat.ppid as u32),
            executable_path: procfs_proc.exe().ok(),
            pcb_data: PcbData {
                memory_rss_kb,
                memory_percent: 0.0,
                state: stat.state,
            },
        })
    }
}

impl Process {
    /// Fill in the memory share given the machine's total memory in kB.
    pub fn set_memory_percent(&mut self, mem_total_kb: u64) {
        self.pcb_data.memory_percent = if mem_total_kb == 0 {
            0.0
        } else {
            (self.pcb_data.memory_rss_kb as f64 / mem_total_kb as f64 * 100.0) as f32
        };
    }

    /// Path for display, `[Path Unknown]` when it could not be read.
    pub fn display_path(&self) -> String {
        match &self.executable_path {
            Some(path) => path.display().to_string(),
            None => "[Path Unknown]".to_string(),
        }
    }
}

/// One entry per distinct name, first occurrence wins. Input order is kept.
pub fn unique_by_name<'a>(processes: &[&'a Process]) -> Vec<&'a Process> {
    let mut added = HashSet::new();
    processes
        .iter()
        .copied()
        .filter(|p| !p.name.is_empty() && added.insert(p.name.as_str()))
        .collect()
}
