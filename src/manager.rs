use std::collections::{HashMap, HashSet};
use crate::process::Process;

pub mod monitoring;
pub mod operations;
pub mod permissions;
pub mod sampler;

use permissions::ProtectionPolicy;


#[derive(Debug)]

//Owns the current process snapshot and the termination policy
pub struct Manager {
    pub processes: HashMap<u32, Process>,
    pub protection: ProtectionPolicy,
}

impl Manager {
    pub fn new(protection: ProtectionPolicy) -> Result<Self, String> {  //Constructor
        let mut manager = Manager::empty(protection);

        //Initial snapshot at initialization
        match monitoring::refresh_processes(&mut manager.processes) {
            Ok(_) => Ok(manager),
            Err(e) => Err(format!("Failed initial process load: {}", e)),
        }
    }

    /// Manager with no snapshot loaded.
    pub fn empty(protection: ProtectionPolicy) -> Self {
        Manager {
            processes: HashMap::new(),
            protection,
        }
    }

    //Deals with live data from Linux system
    pub fn refresh(&mut self) -> Result<(), String> {
        monitoring::refresh_processes(&mut self.processes).map(|_| ())
    }

    pub fn processes(&self) -> Vec<&Process> { //Process getter, ordered by PID
        let mut list: Vec<&Process> = self.processes.values().collect();
        list.sort_by_key(|p| p.process_id);
        list
    }

    /// Lowest PID carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Process> {
        self.next_by_name(name, &HashSet::new())
    }

    /// Lowest PID carrying `name` that is not in `taken`.
    pub fn next_by_name(&self, name: &str, taken: &HashSet<u32>) -> Option<&Process> {
        self.processes
            .values()
            .filter(|p| p.name == name && !taken.contains(&p.process_id))
            .min_by_key(|p| p.process_id)
    }
}
