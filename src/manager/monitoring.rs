use std::collections::HashMap;
use std::convert::TryFrom;

use log::warn;
use procfs::{Current, Meminfo};

use crate::process::Process;

/// Total physical memory in kB, 0 if /proc/meminfo is unreadable.
pub fn mem_total_kb() -> u64 {
    match Meminfo::current() {
        Ok(info) => info.mem_total / 1024,
        Err(e) => {
            warn!("Could not read /proc/meminfo: {}", e);
            0
        }
    }
}

// Reads the /proc filesystem, replaces the provided HashMap with current data, and returns the number of processes successfully loaded.
pub fn refresh_processes(processes: &mut HashMap<u32, Process>) -> Result<usize, String> {

    let procfs_processes = match procfs::process::all_processes() { //Reading intial process list
        Ok(p) => p,
        Err(e) => return Err(format!("Failed to read process list: {}", e)),
    };

    let mut new_processes = HashMap::new(); //New temporary hash_map to store the new process list
    let mem_total = mem_total_kb();

    for p in procfs_processes {
        let procfs_proc = match p {
            Ok(p) => p,
            Err(_) => continue, //Skip listing errors
        };

        let pid = procfs_proc.pid as u32;

        match Process::try_from(pid) {
            Ok(mut proc) => {
                proc.set_memory_percent(mem_total);
                new_processes.insert(pid, proc);
            }
            Err(e) => {
                //Ignore the error if a process vanished between listing and reading its data
                if !matches!(e, procfs::ProcError::NotFound(_)) {
                    warn!("Could not fully read data for PID {}: {:?}", pid, e);
                }
            }
        }
    }

    let loaded = new_processes.len();
    *processes = new_processes; //Replace the old process map with the new one

    Ok(loaded)
}
