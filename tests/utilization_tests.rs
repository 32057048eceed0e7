use resource_tool::{
    AllocationRecord, AllocationStore, Diagnostics, InputBundle, ResourceRecord,
    UtilizationAnalyzer, UtilizationBand,
};

fn resource(id: &str, capacity: f64) -> ResourceRecord {
    ResourceRecord {
        id: id.to_string(),
        name: format!("Resource {id}"),
        resource_type: "human".to_string(),
        capacity: Some(capacity),
        ..Default::default()
    }
}

fn allocation(id: &str, resource_id: &str, pct: f64, start: &str, end: &str) -> AllocationRecord {
    AllocationRecord {
        id: id.to_string(),
        task_id: "t1".to_string(),
        resource_id: resource_id.to_string(),
        allocation_percent: pct,
        start_date: start.to_string(),
        end_date: end.to_string(),
        ..Default::default()
    }
}

fn analyze(inputs: InputBundle) -> resource_tool::UtilizationReport {
    let mut diagnostics = Diagnostics::new();
    let store = AllocationStore::from_inputs(inputs, &mut diagnostics);
    UtilizationAnalyzer::new().analyze(&store)
}

#[test]
fn overlapping_allocations_sum_into_overallocation() {
    let inputs = InputBundle {
        resources: vec![resource("r1", 100.0)],
        allocations: vec![
            allocation("a1", "r1", 60.0, "2025-01-01", "2025-01-10"),
            allocation("a2", "r1", 60.0, "2025-01-05", "2025-01-15"),
        ],
        ..Default::default()
    };
    let report = analyze(inputs);

    let entry = report.entry("r1").unwrap();
    assert_eq!(entry.utilization_rate, 120.0);
    assert_eq!(entry.band, UtilizationBand::Overallocated);
    assert_eq!(entry.efficiency_score, 60.0);
}

#[test]
fn disjoint_allocations_do_not_sum() {
    let inputs = InputBundle {
        resources: vec![resource("r1", 100.0)],
        allocations: vec![
            allocation("a1", "r1", 60.0, "2025-01-01", "2025-01-10"),
            allocation("a2", "r1", 60.0, "2025-02-01", "2025-02-10"),
        ],
        ..Default::default()
    };
    let report = analyze(inputs);

    let entry = report.entry("r1").unwrap();
    assert_eq!(entry.utilization_rate, 60.0);
    assert_eq!(entry.band, UtilizationBand::Underutilized);
    assert_eq!(entry.efficiency_score, 60.0);
}

#[test]
fn capacity_scales_the_rate() {
    let inputs = InputBundle {
        resources: vec![resource("r1", 50.0)],
        allocations: vec![allocation("a1", "r1", 45.0, "2025-01-01", "2025-01-10")],
        ..Default::default()
    };
    let report = analyze(inputs);

    let entry = report.entry("r1").unwrap();
    assert_eq!(entry.utilization_rate, 90.0);
    assert_eq!(entry.band, UtilizationBand::OptimalHigh);
    assert_eq!(entry.efficiency_score, 100.0);
}

#[test]
fn cancelled_allocations_are_invisible() {
    let mut cancelled = allocation("a1", "r1", 90.0, "2025-01-01", "2025-01-10");
    cancelled.status = Some("cancelled".to_string());
    let inputs = InputBundle {
        resources: vec![resource("r1", 100.0)],
        allocations: vec![cancelled],
        ..Default::default()
    };
    let report = analyze(inputs);

    let entry = report.entry("r1").unwrap();
    assert_eq!(entry.utilization_rate, 0.0);
    assert_eq!(entry.band, UtilizationBand::SignificantlyUnderutilized);
}

#[test]
fn overall_efficiency_is_mean_of_scores() {
    let inputs = InputBundle {
        resources: vec![resource("r1", 100.0), resource("r2", 100.0)],
        allocations: vec![
            allocation("a1", "r1", 90.0, "2025-01-01", "2025-01-10"),
            allocation("a2", "r2", 50.0, "2025-01-01", "2025-01-10"),
        ],
        ..Default::default()
    };
    let report = analyze(inputs);

    // r1 scores 100 (in band), r2 scores 50.
    assert_eq!(report.overall_efficiency, 75.0);
}

#[test]
fn analysis_is_idempotent_on_unchanged_input() {
    let build = || InputBundle {
        resources: vec![resource("r1", 100.0), resource("r2", 80.0)],
        allocations: vec![
            allocation("a1", "r1", 60.0, "2025-01-01", "2025-01-10"),
            allocation("a2", "r1", 60.0, "2025-01-05", "2025-01-15"),
            allocation("a3", "r2", 40.0, "2025-01-03", "2025-01-20"),
        ],
        ..Default::default()
    };

    let first = analyze(build());
    let second = analyze(build());
    assert_eq!(first, second);

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}
