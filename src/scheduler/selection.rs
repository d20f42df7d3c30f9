use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::process::Process;
use crate::scheduler::{SchedulerError, Ticks, Workload, WorkloadId};

/// Where burst times come from. The simulator itself never looks at this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstSource {
    /// Uniform in `min..=max`; a seed makes the draw reproducible.
    Random {
        min: Ticks,
        max: Ticks,
        seed: Option<u64>,
    },
    /// One value per selected workload, in selection order.
    Fixed(Vec<Ticks>),
}

impl Default for BurstSource {
    fn default() -> Self {
        BurstSource::Random {
            min: 1,
            max: 10,
            seed: None,
        }
    }
}

impl BurstSource {
    fn bursts(&self, count: usize) -> Result<Vec<Ticks>, SchedulerError> {
        match self {
            BurstSource::Random { min, max, seed } => {
                if *min == 0 || min > max {
                    return Err(SchedulerError::InvalidInput(format!(
                        "random burst range {}..={} must be positive and non-empty",
                        min, max
                    )));
                }
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                Ok((0..count).map(|_| rng.gen_range(*min..=*max)).collect())
            }
            BurstSource::Fixed(values) => {
                if values.len() != count {
                    return Err(SchedulerError::InvalidInput(format!(
                        "expected {} burst times, got {}",
                        count,
                        values.len()
                    )));
                }
                if let Some(pos) = values.iter().position(|&bt| bt == 0) {
                    return Err(SchedulerError::InvalidInput(format!(
                        "burst time #{} must be positive",
                        pos + 1
                    )));
                }
                Ok(values.clone())
            }
        }
    }
}

/// The configuration step in front of the simulator: fixes how many workloads
/// a run takes and supplies their burst times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub size: usize,
    pub burst_source: BurstSource,
}

impl Selection {
    pub fn new(size: usize, burst_source: BurstSource) -> Self {
        Selection { size, burst_source }
    }

    pub fn build(
        &self,
        candidates: Vec<(WorkloadId, String)>,
    ) -> Result<Vec<Workload>, SchedulerError> {
        if candidates.len() != self.size {
            return Err(SchedulerError::SelectionSize {
                expected: self.size,
                actual: candidates.len(),
            });
        }

        let bursts = self.burst_source.bursts(candidates.len())?;

        Ok(candidates
            .into_iter()
            .zip(bursts)
            .map(|((id, name), burst_time)| Workload {
                id,
                name,
                burst_time,
            })
            .collect())
    }
}

/// Resolves names against a process snapshot. Each name takes the lowest PID
/// with that name that has not been picked yet, so repeating a name picks
/// distinct processes.
pub fn select_by_name(
    processes: &[&Process],
    names: &[String],
) -> Result<Vec<(WorkloadId, String)>, SchedulerError> {
    let mut ordered: Vec<&Process> = processes.to_vec();
    ordered.sort_by_key(|p| p.process_id);

    let mut taken = HashSet::new();
    let mut picked = Vec::with_capacity(names.len());

    for name in names {
        let found = ordered
            .iter()
            .find(|p| p.name == *name && !taken.contains(&p.process_id))
            .ok_or_else(|| SchedulerError::UnknownWorkload(name.clone()))?;
        taken.insert(found.process_id);
        picked.push((WorkloadId(found.process_id), found.name.clone()));
    }

    Ok(picked)
}

/// Parses an offline workload given as `name=burst`.
pub fn parse_workload_spec(position: usize, spec: &str) -> Result<Workload, SchedulerError> {
    let (name, burst) = spec.rsplit_once('=').ok_or_else(|| {
        SchedulerError::InvalidInput(format!("'{}' is not of the form NAME=BURST", spec))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(SchedulerError::InvalidInput(format!(
            "'{}' has an empty workload name",
            spec
        )));
    }

    let burst_time: Ticks = burst.trim().parse().map_err(|_| {
        SchedulerError::InvalidInput(format!("'{}' is not a valid burst time", burst.trim()))
    })?;
    if burst_time == 0 {
        return Err(SchedulerError::InvalidInput(format!(
            "burst time of '{}' must be positive",
            name
        )));
    }

    Ok(Workload::new(WorkloadId(position as u32), name, burst_time))
}
