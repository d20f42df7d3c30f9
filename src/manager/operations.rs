use std::collections::HashSet;
use std::fmt;

use log::{info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::manager::permissions;
use crate::manager::Manager;


//Kill (Force terminate)
pub fn kill_process(pid: u32) -> Result<(), String> {
    let nix_pid = Pid::from_raw(pid as i32);

    signal::kill(nix_pid, Signal::SIGKILL)
        .map_err(|e| format!("Failed to send SIGKILL to PID {}: {}", pid, e))
}

//Terminate (Graceful stop)
//Sends SIGTERM, giving process a chance to shut down cleanly
pub fn terminate_process(pid: u32) -> Result<(), String> {
    let nix_pid = Pid::from_raw(pid as i32);

    signal::kill(nix_pid, Signal::SIGTERM)
        .map_err(|e| format!("Failed to send SIGTERM to PID {}: {}", pid, e))
}


/// Outcome of a by-name termination request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    pub successful: usize,
    pub failed: usize,
    pub protected: Vec<String>,
}

impl fmt::Display for TerminationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Termination Results:")?;
        writeln!(f, "  Successfully terminated: {}", self.successful)?;
        write!(f, "  Failed: {}", self.failed)?;
        if !self.protected.is_empty() {
            write!(f, "\n  Protected (not terminated): {}", self.protected.join(", "))?;
        }
        Ok(())
    }
}

//Terminates one process per listed name, lowest PID first; a repeated name moves on to the next
//instance. Protected names are skipped and reported
pub fn terminate_by_names(manager: &Manager, names: &[String], force: bool) -> TerminationReport {
    terminate_with(manager, names, |pid| {
        if force {
            kill_process(pid)
        } else {
            terminate_process(pid)
        }
    })
}

fn terminate_with<F>(manager: &Manager, names: &[String], mut send: F) -> TerminationReport
where
    F: FnMut(u32) -> Result<(), String>,
{
    let mut report = TerminationReport::default();
    let mut signalled: HashSet<u32> = HashSet::new();

    for name in names {
        if let Err(e) = permissions::check_not_protected(manager, name) {
            info!("{}", e);
            report.protected.push(name.clone());
            continue;
        }

        let target = match manager.next_by_name(name, &signalled).map(|p| p.process_id) {
            Some(pid) => {
                signalled.insert(pid);
                pid
            }
            None => {
                warn!("No remaining running process named '{}'", name);
                report.failed += 1;
                continue;
            }
        };

        match send(target) {
            Ok(()) => {
                info!("Signalled '{}' (PID {})", name, target);
                report.successful += 1;
            }
            Err(e) => {
                warn!("Failed to terminate {}: {}", name, e);
                report.failed += 1;
            }
        }
    }

    report
}
