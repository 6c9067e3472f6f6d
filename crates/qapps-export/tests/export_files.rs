use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use qapps_core::{Application, RunMetadata, SubApplicationItem, UsageMetadata};
use qapps_export::{
    build_rows, ApplicationRows, ColumnSet, ExportError, ExportFormat, ExportReport, Exporter,
};

fn run() -> RunMetadata {
    RunMetadata {
        retrieval_timestamp: Utc.with_ymd_and_hms(2025, 11, 11, 9, 30, 0).unwrap(),
        region: "us-east-1".to_string(),
        account_id: Some("123456789012".to_string()),
    }
}

fn inventory() -> Vec<ApplicationRows> {
    let sales = Application {
        name: Some("Sales Assistant".to_string()),
        status: Some("ACTIVE".to_string()),
        ..Application::new("app-sales")
    };
    let items = (1..=3)
        .map(|i| {
            let item = SubApplicationItem {
                title: Some(format!("Report, part {}", i)),
                description: Some("Summarises \"pipeline\" data".to_string()),
                ..SubApplicationItem::new("app-sales", format!("item-{}", i))
            };
            let usage = (i != 2).then(|| UsageMetadata {
                user_count: Some(10 * i),
                categories: vec!["Sales".into(), "Reporting".into(), "Weekly".into()],
                ..UsageMetadata::default()
            });
            (item, usage)
        })
        .collect();

    vec![
        ApplicationRows {
            application: sales,
            items,
        },
        ApplicationRows {
            application: Application::new("app-empty"),
            items: Vec::new(),
        },
    ]
}

fn written(report: &ExportReport, format: ExportFormat) -> &Path {
    report
        .written
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, path)| path.as_path())
        .unwrap()
}

fn exporter(dir: &Path) -> Exporter {
    Exporter::new(dir, vec![ExportFormat::Csv, ExportFormat::Json], true)
}

#[test]
fn test_both_formats_written() {
    let dir = tempfile::tempdir().unwrap();
    let rows = build_rows(inventory(), true, &run());
    let columns = ColumnSet::all();

    let report = exporter(dir.path())
        .export("qapps_export_20251111_093000", &columns, &rows)
        .unwrap();

    assert!(report.failures.is_empty());
    assert!(report.is_acceptable(true));

    let csv_path = written(&report, ExportFormat::Csv);
    assert_eq!(
        csv_path.file_name().unwrap(),
        "qapps_export_20251111_093000.csv"
    );
    let mut reader = csv::Reader::from_path(csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 25);
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 4);

    let name = headers.iter().position(|h| h == "qapp_name").unwrap();
    let users = headers.iter().position(|h| h == "user_count").unwrap();
    assert_eq!(&records[0][name], "Report, part 1");
    assert_eq!(&records[1][users], "");
    assert_eq!(&records[3][name], "");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written(&report, ExportFormat::Json)).unwrap())
            .unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["categories"].as_array().unwrap().len(), 3);
    assert_eq!(records[0]["description"], "Summarises \"pipeline\" data");
    assert!(records[1]["user_count"].is_null());
    assert_eq!(records[3]["qbusiness_app_id"], "app-empty");
}

#[test]
fn test_empty_inventory_writes_header_and_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let columns = ColumnSet::all();
    let report = exporter(dir.path()).export("empty", &columns, &[]).unwrap();

    let csv = fs::read_to_string(written(&report, ExportFormat::Csv)).unwrap();
    assert_eq!(csv.lines().count(), 1);
    let json = fs::read_to_string(written(&report, ExportFormat::Json)).unwrap();
    assert_eq!(json.trim(), "[]");
}

#[test]
fn test_disabled_column_absent_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let rows = build_rows(inventory(), false, &run());
    let overrides = BTreeMap::from([("categories".to_string(), false)]);
    let columns = ColumnSet::resolve(&overrides).unwrap();

    let report = exporter(dir.path()).export("cols", &columns, &rows).unwrap();

    let mut reader = csv::Reader::from_path(written(&report, ExportFormat::Csv)).unwrap();
    assert!(!reader.headers().unwrap().iter().any(|h| h == "categories"));
    assert_eq!(reader.records().count(), 3);

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(written(&report, ExportFormat::Json)).unwrap(),
    )
    .unwrap();
    assert!(json[0].get("categories").is_none());
}

#[test]
fn test_one_format_failing_keeps_the_other() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the JSON path makes the final rename fail
    fs::create_dir(dir.path().join("blocked.json")).unwrap();

    let rows = build_rows(inventory(), true, &run());
    let report = exporter(dir.path())
        .export("blocked", &ColumnSet::all(), &rows)
        .unwrap();

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.written[0].0, ExportFormat::Csv);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].format, ExportFormat::Json);
    assert!(matches!(report.failures[0].error, ExportError::Persist { .. }));

    assert!(report.is_acceptable(false));
    assert!(!report.is_acceptable(true));
}

#[test]
fn test_output_dir_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reports").join("q");
    let report = Exporter::new(&nested, vec![ExportFormat::Csv], false)
        .export("x", &ColumnSet::all(), &[])
        .unwrap();

    let csv = fs::read_to_string(written(&report, ExportFormat::Csv)).unwrap();
    assert_eq!(csv, "");
}
