use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, trace};
use serde::Serialize;

use crate::scheduler::{SchedulerError, Ticks, Workload, WorkloadId};

// Per-workload lifecycle inside one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkloadState {
    Ready,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Requeued,
    Completed,
}

/// One CPU grant: `slice` ticks starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub id: WorkloadId,
    pub start: Ticks,
    pub slice: Ticks,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub id: WorkloadId,
    pub name: String,
    pub burst_time: Ticks,
    pub completion_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
}

/// Result of one simulation run. Rows keep the input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub quantum: Ticks,
    pub makespan: Ticks,
    pub rows: Vec<ScheduleRow>,
    pub trace: Vec<Dispatch>,
}

impl ScheduleReport {
    pub fn average_turnaround(&self) -> f64 {
        average(self.rows.iter().map(|r| r.turnaround_time))
    }

    pub fn average_waiting(&self) -> f64 {
        average(self.rows.iter().map(|r| r.waiting_time))
    }

    pub fn row(&self, id: WorkloadId) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

fn average(values: impl Iterator<Item = Ticks>) -> f64 {
    // Completion times can sum past u64 even when the makespan fits
    let (sum, count) = values.fold((0u128, 0u128), |(s, c), v| (s + v as u128, c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn validate(workloads: &[Workload], quantum: Ticks) -> Result<(), SchedulerError> {
    if workloads.is_empty() {
        return Err(SchedulerError::InvalidInput(
            "workload set is empty".to_string(),
        ));
    }
    if quantum == 0 {
        return Err(SchedulerError::InvalidInput(
            "time quantum must be positive".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(workloads.len());
    let mut total: Ticks = 0;
    for w in workloads {
        if w.burst_time == 0 {
            return Err(SchedulerError::InvalidInput(format!(
                "burst time of '{}' (id {}) must be positive",
                w.name, w.id
            )));
        }
        if !seen.insert(w.id) {
            return Err(SchedulerError::InvalidInput(format!(
                "workload id {} appears more than once",
                w.id
            )));
        }
        total = total.checked_add(w.burst_time).ok_or_else(|| {
            SchedulerError::InvalidInput("total burst time overflows the clock".to_string())
        })?;
    }

    Ok(())
}

/// Runs Round-Robin over `workloads`, all arriving at time 0, with a fixed `quantum`.
///
/// The head of the ready queue gets `min(quantum, remaining)` ticks; a workload that
/// still owes time goes back to the tail, otherwise its completion time is recorded.
/// Turnaround and waiting times are derived afterwards. Invalid input yields
/// [`SchedulerError::InvalidInput`] and no report at all.
pub fn simulate(workloads: &[Workload], quantum: Ticks) -> Result<ScheduleReport, SchedulerError> {
    validate(workloads, quantum)?;

    let mut remaining: HashMap<WorkloadId, Ticks> =
        workloads.iter().map(|w| (w.id, w.burst_time)).collect();
    let mut states: HashMap<WorkloadId, WorkloadState> = workloads
        .iter()
        .map(|w| (w.id, WorkloadState::Ready))
        .collect();
    let mut ready: VecDeque<WorkloadId> = workloads.iter().map(|w| w.id).collect();
    let mut completion: HashMap<WorkloadId, Ticks> = HashMap::with_capacity(workloads.len());
    let mut trace = Vec::new();
    let mut clock: Ticks = 0;

    while let Some(id) = ready.pop_front() {
        debug_assert_eq!(
            states[&id],
            WorkloadState::Ready,
            "workload {id} dispatched while not Ready"
        );
        states.insert(id, WorkloadState::Running);

        // Every queued id was seeded into `remaining` from the same input
        let Some(owed) = remaining.get_mut(&id) else {
            debug_assert!(false, "workload {id} missing from remaining-time table");
            continue;
        };
        let slice = quantum.min(*owed);
        *owed -= slice;
        let left = *owed;

        let start = clock;
        clock += slice;

        let outcome = if left == 0 {
            let previous = completion.insert(id, clock);
            debug_assert!(previous.is_none(), "workload {id} completed twice");
            states.insert(id, WorkloadState::Completed);
            DispatchOutcome::Completed
        } else {
            debug_assert!(!ready.contains(&id), "workload {id} already queued");
            states.insert(id, WorkloadState::Ready);
            ready.push_back(id);
            DispatchOutcome::Requeued
        };

        trace!("t={} dispatch {} for {} -> {:?}", start, id, slice, outcome);
        trace.push(Dispatch {
            id,
            start,
            slice,
            outcome,
        });
    }

    debug_assert!(states.values().all(|s| *s == WorkloadState::Completed));

    let rows = workloads
        .iter()
        .map(|w| {
            let completion_time = completion.get(&w.id).copied().ok_or_else(|| {
                SchedulerError::InvalidInput(format!("workload {} never completed", w.id))
            })?;
            let turnaround_time = completion_time; // Arrival is 0 for every workload
            Ok(ScheduleRow {
                id: w.id,
                name: w.name.clone(),
                burst_time: w.burst_time,
                completion_time,
                turnaround_time,
                waiting_time: turnaround_time - w.burst_time,
            })
        })
        .collect::<Result<Vec<ScheduleRow>, SchedulerError>>()?;

    debug!(
        "Round-Robin finished: {} workloads, quantum {}, makespan {}, {} dispatches",
        rows.len(),
        quantum,
        clock,
        trace.len()
    );

    Ok(ScheduleReport {
        quantum,
        makespan: clock,
        rows,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workloads(bursts: &[Ticks]) -> Vec<Workload> {
        bursts
            .iter()
            .enumerate()
            .map(|(i, &bt)| Workload::new(WorkloadId(i as u32), &format!("w{}", i), bt))
            .collect()
    }

    #[test]
    fn single_workload_runs_to_completion() {
        let report = simulate(&workloads(&[7]), 4).unwrap();
        let row = &report.rows[0];
        assert_eq!(row.completion_time, 7);
        assert_eq!(row.turnaround_time, 7);
        assert_eq!(row.waiting_time, 0);
        assert_eq!(report.makespan, 7);
        assert_eq!(report.trace.len(), 2);
    }

    #[test]
    fn preempted_workload_goes_to_tail() {
        let input = vec![
            Workload::new(WorkloadId(1), "A", 5),
            Workload::new(WorkloadId(2), "B", 3),
        ];
        let report = simulate(&input, 4).unwrap();

        let order: Vec<(u32, Ticks, Ticks)> = report
            .trace
            .iter()
            .map(|d| (d.id.0, d.start, d.slice))
            .collect();
        assert_eq!(order, vec![(1, 0, 4), (2, 4, 3), (1, 7, 1)]);

        let a = report.row(WorkloadId(1)).unwrap();
        let b = report.row(WorkloadId(2)).unwrap();
        assert_eq!((a.completion_time, a.turnaround_time, a.waiting_time), (8, 8, 3));
        assert_eq!((b.completion_time, b.turnaround_time, b.waiting_time), (7, 7, 4));
    }

    #[test]
    fn exact_quantum_bursts_complete_in_order() {
        let report = simulate(&workloads(&[4, 4, 4]), 4).unwrap();
        let completions: Vec<Ticks> = report.rows.iter().map(|r| r.completion_time).collect();
        let waits: Vec<Ticks> = report.rows.iter().map(|r| r.waiting_time).collect();
        assert_eq!(completions, vec![4, 8, 12]);
        assert_eq!(waits, vec![0, 4, 8]);
        assert!(report
            .trace
            .iter()
            .all(|d| d.outcome == DispatchOutcome::Completed));
    }

    #[test]
    fn rows_keep_input_order() {
        let input = vec![
            Workload::new(WorkloadId(30), "late", 9),
            Workload::new(WorkloadId(10), "early", 1),
        ];
        let report = simulate(&input, 2).unwrap();
        let ids: Vec<u32> = report.rows.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![30, 10]);
    }

    #[test]
    fn duplicate_names_do_not_collide() {
        let input = vec![
            Workload::new(WorkloadId(100), "bash", 6),
            Workload::new(WorkloadId(200), "bash", 2),
        ];
        let report = simulate(&input, 4).unwrap();
        assert_eq!(report.rows[0].completion_time, 8);
        assert_eq!(report.rows[1].completion_time, 6);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(
            simulate(&[], 4),
            Err(SchedulerError::InvalidInput(_))
        ));
        assert!(matches!(
            simulate(&workloads(&[3]), 0),
            Err(SchedulerError::InvalidInput(_))
        ));
        assert!(matches!(
            simulate(&workloads(&[3, 0, 2]), 4),
            Err(SchedulerError::InvalidInput(_))
        ));

        let dup = vec![
            Workload::new(WorkloadId(1), "a", 1),
            Workload::new(WorkloadId(1), "b", 1),
        ];
        assert!(matches!(
            simulate(&dup, 4),
            Err(SchedulerError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_clock_overflow() {
        let result = simulate(&workloads(&[Ticks::MAX, 1]), 4);
        assert!(matches!(result, Err(SchedulerError::InvalidInput(_))));
    }

    #[test]
    fn averages() {
        let input = vec![
            Workload::new(WorkloadId(1), "A", 5),
            Workload::new(WorkloadId(2), "B", 3),
        ];
        let report = simulate(&input, 4).unwrap();
        assert_eq!(report.average_turnaround(), 7.5);
        assert_eq!(report.average_waiting(), 3.5);
    }

    #[test]
    fn averages_survive_completion_sums_past_u64() {
        let half = Ticks::MAX / 2;
        let report = simulate(&workloads(&[half, half]), Ticks::MAX).unwrap();
        assert_eq!(report.makespan, half * 2);
        assert_eq!(report.rows[1].completion_time, half * 2);

        let expected = (3 * half as u128) as f64 / 2.0;
        assert_eq!(report.average_turnaround(), expected);
        assert_eq!(report.average_waiting(), half as f64 / 2.0);
    }
}
