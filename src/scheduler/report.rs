use std::fmt;

use crate::scheduler::{DispatchOutcome, ScheduleReport};

/// BT/CT/TAT/WT table, one row per workload in input order.
pub struct Table<'a>(pub &'a ScheduleReport);

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        writeln!(
            f,
            "{:<25}{:<10}{:<10}{:<10}{:<10}",
            "Process", "BT", "CT", "TAT", "WT"
        )?;
        writeln!(f, "{}", "-".repeat(65))?;

        for row in &report.rows {
            let label = format!("{} ({})", truncate(&row.name, 16), row.id);
            writeln!(
                f,
                "{:<25}{:<10}{:<10}{:<10}{:<10}",
                label, row.burst_time, row.completion_time, row.turnaround_time, row.waiting_time
            )?;
        }

        writeln!(f, "{}", "-".repeat(65))?;
        writeln!(
            f,
            "Quantum: {}  Makespan: {}  Avg TAT: {:.2}  Avg WT: {:.2}",
            report.quantum,
            report.makespan,
            report.average_turnaround(),
            report.average_waiting()
        )
    }
}

/// Dispatch order, one line per CPU grant.
pub struct Trace<'a>(pub &'a ScheduleReport);

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        for dispatch in &report.trace {
            let name = report
                .row(dispatch.id)
                .map(|r| r.name.as_str())
                .unwrap_or("?");
            let marker = match dispatch.outcome {
                DispatchOutcome::Completed => "done",
                DispatchOutcome::Requeued => "requeued",
            };
            writeln!(
                f,
                "[{:>4} -> {:>4}] {} ({}) ran {} [{}]",
                dispatch.start,
                dispatch.start + dispatch.slice,
                name,
                dispatch.id,
                dispatch.slice,
                marker
            )?;
        }
        Ok(())
    }
}

pub fn render_table(report: &ScheduleReport) -> String {
    Table(report).to_string()
}

pub fn render_trace(report: &ScheduleReport) -> String {
    Trace(report).to_string()
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(max - 1).collect();
        short.push('~');
        short
    }
}
