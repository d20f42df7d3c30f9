use std::fmt;

use serde::Serialize;

pub mod report;
pub mod round_robin;
pub mod selection;

pub use round_robin::{simulate, Dispatch, DispatchOutcome, ScheduleReport, ScheduleRow};
pub use selection::{BurstSource, Selection};

/// Simulated time units. The clock never follows wall-clock time.
pub type Ticks = u64;

/// Time quantum used when nothing else is configured.
pub const DEFAULT_QUANTUM: Ticks = 4;

/// Stable identifier of a workload within one run.
/// For live processes this is the PID, for offline workloads the input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WorkloadId(pub u32);

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of CPU-only work handed to the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub id: WorkloadId,
    pub name: String, // Display only, may repeat across workloads
    pub burst_time: Ticks,
}

impl Workload {
    pub fn new(id: WorkloadId, name: &str, burst_time: Ticks) -> Self {
        Workload {
            id,
            name: name.to_string(),
            burst_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Empty workload set, non-positive burst or quantum, duplicate ids, malformed burst input.
    InvalidInput(String),
    /// The selection step did not get the configured number of workloads.
    SelectionSize { expected: usize, actual: usize },
    /// A requested workload name matched nothing in the process snapshot.
    UnknownWorkload(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::InvalidInput(reason) => write!(f, "Invalid input: {}", reason),
            SchedulerError::SelectionSize { expected, actual } => write!(
                f,
                "Please select exactly {} processes (got {}).",
                expected, actual
            ),
            SchedulerError::UnknownWorkload(name) => {
                write!(f, "No running process named '{}'", name)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}
