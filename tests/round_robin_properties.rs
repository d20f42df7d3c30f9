use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rr_optimizer::scheduler::{
    simulate, BurstSource, SchedulerError, Selection, Ticks, Workload, WorkloadId,
};

fn random_workloads(rng: &mut StdRng) -> Vec<Workload> {
    let count = rng.gen_range(1..=8);
    (0..count)
        .map(|i| Workload::new(WorkloadId(i), &format!("job{}", i), rng.gen_range(1..=20)))
        .collect()
}

#[test]
fn makespan_equals_total_burst_and_latest_completion() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let input = random_workloads(&mut rng);
        let quantum = rng.gen_range(1..=6);
        let report = simulate(&input, quantum).unwrap();

        let total: Ticks = input.iter().map(|w| w.burst_time).sum();
        let latest = report.rows.iter().map(|r| r.completion_time).max().unwrap();
        assert_eq!(report.makespan, total);
        assert_eq!(latest, total);
    }
}

#[test]
fn waiting_and_turnaround_bounds_hold() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let input = random_workloads(&mut rng);
        let quantum = rng.gen_range(1..=6);
        let report = simulate(&input, quantum).unwrap();

        for (w, row) in input.iter().zip(&report.rows) {
            assert_eq!(w.id, row.id);
            assert!(row.turnaround_time >= row.burst_time);
            assert_eq!(row.waiting_time, row.turnaround_time - row.burst_time);
        }
    }
}

#[test]
fn dispatch_count_matches_ceil_burst_over_quantum() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..100 {
        let input = random_workloads(&mut rng);
        let quantum = rng.gen_range(1..=6);
        let report = simulate(&input, quantum).unwrap();

        let expected: usize = input
            .iter()
            .map(|w| w.burst_time.div_ceil(quantum) as usize)
            .sum();
        assert_eq!(report.trace.len(), expected);
        assert!(report.trace.iter().all(|d| d.slice >= 1 && d.slice <= quantum));
    }
}

#[test]
fn identical_inputs_give_identical_reports() {
    let input = vec![
        Workload::new(WorkloadId(3), "a", 9),
        Workload::new(WorkloadId(1), "b", 2),
        Workload::new(WorkloadId(2), "c", 5),
    ];
    assert_eq!(simulate(&input, 3).unwrap(), simulate(&input, 3).unwrap());
}

#[test]
fn large_quantum_degenerates_to_fcfs() {
    let bursts = [6, 2, 9, 1, 4];
    let input: Vec<Workload> = bursts
        .iter()
        .enumerate()
        .map(|(i, &bt)| Workload::new(WorkloadId(i as u32), "w", bt))
        .collect();
    let report = simulate(&input, 10).unwrap();

    let mut running = 0;
    for (row, bt) in report.rows.iter().zip(bursts) {
        running += bt;
        assert_eq!(row.completion_time, running);
    }
}

#[test]
fn invalid_input_never_produces_a_report() {
    assert!(matches!(simulate(&[], 4), Err(SchedulerError::InvalidInput(_))));

    let one = vec![Workload::new(WorkloadId(0), "x", 3)];
    assert!(matches!(simulate(&one, 0), Err(SchedulerError::InvalidInput(_))));

    let zero_burst = vec![Workload::new(WorkloadId(0), "x", 0)];
    assert!(matches!(
        simulate(&zero_burst, 4),
        Err(SchedulerError::InvalidInput(_))
    ));
}

#[test]
fn five_random_selections_simulate_cleanly() {
    let selection = Selection::new(
        5,
        BurstSource::Random {
            min: 1,
            max: 10,
            seed: Some(5),
        },
    );
    let candidates = (0..5)
        .map(|i| (WorkloadId(1000 + i), format!("proc{}", i)))
        .collect();
    let input = selection.build(candidates).unwrap();
    let report = simulate(&input, 4).unwrap();

    assert_eq!(report.rows.len(), 5);
    let total: Ticks = input.iter().map(|w| w.burst_time).sum();
    assert_eq!(report.makespan, total);
}
