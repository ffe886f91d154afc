use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn get_kestrel_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("kestrel")
}

/// Helper to get path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(filename)
}

const DATASETS: &[&str] = &[
    "processing_stats",
    "general_stats",
    "http_distribution",
    "cdn_vs_direct",
    "endpoints_by_code",
    "top_endpoints",
    "hourly_analysis",
    "slow_endpoints",
    "endpoint_detail",
];

#[test]
fn test_csv_export_writes_one_file_per_dataset() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::new(get_kestrel_bin());
    cmd.arg("analyze")
        .arg(fixture_path("access.log"))
        .arg("-t")
        .arg("1.0")
        .arg("--export")
        .arg("csv")
        .arg("--csv-dir")
        .arg(temp_dir.path());

    cmd.assert().success();

    for name in DATASETS {
        let path = temp_dir.path().join(format!("access_{}.csv", name));
        assert!(path.exists(), "missing {}", path.display());
    }

    let general = fs::read_to_string(temp_dir.path().join("access_general_stats.csv")).unwrap();
    let mut lines = general.lines();
    assert_eq!(lines.next(), Some("Metric,Value,Percentage"));
    assert_eq!(lines.next(), Some("Total Requests,32,100.0%"));

    let hourly = fs::read_to_string(temp_dir.path().join("access_hourly_analysis.csv")).unwrap();
    assert!(hourly.starts_with("Hour,Requests,CDN,Direct,Slow,Errors_499,"));
    assert!(hourly.lines().any(|l| l.starts_with("08:00,8,3,5,2,1,")));
    assert_eq!(hourly.lines().count(), 5);
}

#[test]
fn test_excel_export_writes_workbook() {
    let temp_dir = TempDir::new().unwrap();
    let workbook = temp_dir.path().join("report.xlsx");

    let mut cmd = Command::new(get_kestrel_bin());
    cmd.arg("analyze")
        .arg(fixture_path("access.log"))
        .arg("--export")
        .arg("excel")
        .arg("--output")
        .arg(&workbook);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Exported"));

    let bytes = fs::read(&workbook).unwrap();
    // xlsx files are zip archives
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_both_exports() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::new(get_kestrel_bin());
    cmd.arg("analyze")
        .arg(fixture_path("access.log"))
        .arg("-e")
        .arg("both")
        .arg("-o")
        .arg(temp_dir.path().join("out.xlsx"))
        .arg("--csv-dir")
        .arg(temp_dir.path().join("csv"));

    cmd.assert().success();

    assert!(temp_dir.path().join("out.xlsx").exists());
    assert!(
        temp_dir
            .path()
            .join("csv")
            .join("access_top_endpoints.csv")
            .exists()
    );
}

#[test]
fn test_export_failure_keeps_report_and_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let mut cmd = Command::new(get_kestrel_bin());
    cmd.arg("analyze")
        .arg(fixture_path("access.log"))
        .arg("-e")
        .arg("csv")
        .arg("--csv-dir")
        .arg(blocker.join("csv"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Access Log Analysis"))
        .stderr(predicate::str::contains("Export failed"));
}

#[test]
fn test_failed_workbook_still_writes_csv() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let csv_dir = temp_dir.path().join("csv");

    let mut cmd = Command::new(get_kestrel_bin());
    cmd.arg("analyze")
        .arg(fixture_path("access.log"))
        .arg("-t")
        .arg("1.0")
        .arg("-e")
        .arg("both")
        .arg("-o")
        .arg(blocker.join("out.xlsx"))
        .arg("--csv-dir")
        .arg(&csv_dir);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Export failed: Excel export"))
        .stderr(predicate::str::contains("access_top_endpoints.csv"));

    for name in DATASETS {
        let path = csv_dir.join(format!("access_{}.csv", name));
        assert!(path.exists(), "missing {}", path.display());
    }
}
