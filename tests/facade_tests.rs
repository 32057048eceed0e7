use resource_tool::{
    AllocationRecord, AnalysisBundle, AnalysisConfig, ConflictType, DiagnosticKind, InputBundle,
    ResourceManager, ResourceRecord, SnapshotError, UtilizationBand,
};

fn resource(id: &str, capacity: f64, hourly: Option<f64>) -> ResourceRecord {
    ResourceRecord {
        id: id.to_string(),
        name: format!("Resource {id}"),
        resource_type: "human".to_string(),
        capacity: Some(capacity),
        hourly_cost: hourly,
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

fn sample_inputs() -> InputBundle {
    InputBundle {
        resources: vec![resource("r1", 100.0, Some(50.0))],
        allocations: vec![
            allocation("a1", "r1", 60.0, "2025-01-01", "2025-01-10"),
            allocation("a2", "r1", 60.0, "2025-01-05", "2025-01-15"),
        ],
        ..Default::default()
    }
}

#[test]
fn run_assembles_every_section_of_the_bundle() {
    let bundle = ResourceManager::new().run(sample_inputs());

    assert_eq!(bundle.enriched_allocations.len(), 2);
    assert!(bundle.cost_summary.total_cost > 0.0);

    let entry = bundle.utilization_report.entry("r1").unwrap();
    assert_eq!(entry.band, UtilizationBand::Overallocated);

    assert_eq!(bundle.conflicts.len(), 1);
    assert_eq!(bundle.conflicts[0].conflict_type, ConflictType::TimeOverlap);

    // The leveler pushed a2 clear of a1.
    let a2 = bundle.leveled_schedule.find("a2").unwrap();
    assert_eq!(a2.shifted_days, 6);

    assert!(!bundle.recommendations.is_empty());
    assert_eq!(bundle.recommendations[0].resource_id, "r1");
    assert!(bundle.diagnostics.is_empty());
}

#[test]
fn bad_records_surface_as_warnings_not_errors() {
    let mut inputs = sample_inputs();
    inputs
        .allocations
        .push(allocation("a3", "ghost", 50.0, "2025-01-01", "2025-01-05"));
    inputs
        .allocations
        .push(allocation("a4", "r1", 50.0, "garbage", "2025-01-05"));

    let bundle = ResourceManager::new().run(inputs);

    // Valid records still analyzed in full.
    assert_eq!(bundle.enriched_allocations.len(), 2);
    assert_eq!(
        bundle.diagnostics.count_of(DiagnosticKind::MissingReference),
        1
    );
    assert_eq!(bundle.diagnostics.count_of(DiagnosticKind::Validation), 1);
}

#[test]
fn summary_line_reports_the_headline_numbers() {
    let bundle = ResourceManager::new().run(sample_inputs());
    let summary = bundle.summary();

    assert!(summary.contains("allocations=2"));
    assert!(summary.contains("conflicts=1"));
    assert!(summary.contains("efficiency="));
    assert!(summary.contains("cost="));
    assert!(!summary.contains("warnings="));
}

#[test]
fn config_controls_hours_and_horizon() {
    let manager = ResourceManager::with_config(AnalysisConfig {
        working_hours_per_day: 4.0,
        leveling_horizon_days: 365,
    });
    let bundle = manager.run(sample_inputs());

    // a1: 10d * 4h * 0.6 * $50, a2: 11d * 4h * 0.6 * $50.
    assert_eq!(bundle.cost_summary.total_cost, 1200.0 + 1320.0);
}

#[test]
fn run_file_publishes_the_bundle_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("inputs.json");
    let output_path = dir.path().join("analysis.json");

    let json = serde_json::to_string_pretty(&sample_inputs()).unwrap();
    std::fs::write(&input_path, json).unwrap();

    let bundle = ResourceManager::new()
        .run_file(&input_path, &output_path)
        .unwrap();

    assert!(output_path.exists());
    assert!(!dir.path().join("analysis.json.tmp").exists());

    let published: AnalysisBundle =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(published, bundle);
}

#[test]
fn failed_run_leaves_published_bundle_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("inputs.json");
    let output_path = dir.path().join("analysis.json");

    let json = serde_json::to_string_pretty(&sample_inputs()).unwrap();
    std::fs::write(&input_path, json).unwrap();

    let manager = ResourceManager::new();
    manager.run_file(&input_path, &output_path).unwrap();
    let published = std::fs::read_to_string(&output_path).unwrap();

    // A vanished input must not disturb the published bundle.
    std::fs::remove_file(&input_path).unwrap();
    assert!(manager.run_file(&input_path, &output_path).is_err());
    assert_eq!(std::fs::read_to_string(&output_path).unwrap(), published);

    // Neither may a malformed one.
    std::fs::write(&input_path, "{not json").unwrap();
    assert!(manager.run_file(&input_path, &output_path).is_err());
    assert_eq!(std::fs::read_to_string(&output_path).unwrap(), published);
    assert!(!dir.path().join("analysis.json.tmp").exists());
}

#[test]
fn missing_input_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ResourceManager::new().run_file(
        dir.path().join("nope.json"),
        dir.path().join("out.json"),
    );

    assert!(matches!(result, Err(SnapshotError::Io(_))));
}

#[test]
fn malformed_input_json_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("inputs.json");
    std::fs::write(&input_path, "{not json").unwrap();

    let result =
        ResourceManager::new().run_file(&input_path, dir.path().join("out.json"));

    assert!(matches!(result, Err(SnapshotError::Serialization(_))));
}

#[test]
fn empty_snapshot_yields_an_empty_bundle() {
    let bundle = ResourceManager::new().run(InputBundle::default());

    assert!(bundle.enriched_allocations.is_empty());
    assert!(bundle.conflicts.is_empty());
    assert!(bundle.recommendations.is_empty());
    assert_eq!(bundle.cost_summary.total_cost, 0.0);
    assert_eq!(bundle.utilization_report.overall_efficiency, 0.0);
}
