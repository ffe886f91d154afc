pub mod csv;
pub mod excel;

use crate::ExportFormat;
use kestrel_core::export::Dataset;
use std::path::{Path, PathBuf};

/// Where each export format is written for one log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTargets {
    pub workbook: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    /// File name prefix for CSV files
    pub stem: String,
}

impl ExportTargets {
    /// `<log dir>/<stem>_analysis.xlsx` and `<log dir>/<stem>_<dataset>.csv`
    /// unless overridden.
    pub fn for_log(
        log_file: &Path,
        format: ExportFormat,
        output: Option<PathBuf>,
        csv_dir: Option<PathBuf>,
    ) -> Self {
        let stem = log_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "access".to_string());
        let log_dir = log_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let workbook = format
            .includes_excel()
            .then(|| output.unwrap_or_else(|| log_dir.join(format!("{}_analysis.xlsx", stem))));
        let csv_dir = format
            .includes_csv()
            .then(|| csv_dir.unwrap_or(log_dir));

        Self {
            workbook,
            csv_dir,
            stem,
        }
    }
}

/// Result of writing every requested export
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<anyhow::Error>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write every requested export. Each target is attempted even when an
/// earlier one failed.
pub fn write_all(datasets: &[Dataset], targets: &ExportTargets) -> ExportReport {
    let mut report = ExportReport::default();

    if let Some(path) = &targets.workbook {
        match excel::write_workbook(datasets, path) {
            Ok(()) => report.written.push(path.clone()),
            Err(e) => report.failures.push(e.context("Excel export")),
        }
    }
    if let Some(dir) = &targets.csv_dir {
        match csv::write_datasets(datasets, dir, &targets.stem) {
            Ok(paths) => report.written.extend(paths),
            Err(e) => report.failures.push(e.context("CSV export")),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::aggregate::Aggregator;
    use kestrel_core::export::DatasetBuilder;
    use kestrel_core::origin::DirectOnly;
    use tempfile::TempDir;

    #[test]
    fn test_default_targets_sit_next_to_log() {
        let targets = ExportTargets::for_log(
            Path::new("/var/log/nginx/access.log"),
            ExportFormat::Both,
            None,
            None,
        );
        assert_eq!(
            targets.workbook,
            Some(PathBuf::from("/var/log/nginx/access_analysis.xlsx"))
        );
        assert_eq!(targets.csv_dir, Some(PathBuf::from("/var/log/nginx")));
        assert_eq!(targets.stem, "access");
    }

    #[test]
    fn test_overrides_and_format_selection() {
        let targets = ExportTargets::for_log(
            Path::new("logs/site.log"),
            ExportFormat::Excel,
            Some(PathBuf::from("out/report.xlsx")),
            Some(PathBuf::from("ignored")),
        );
        assert_eq!(targets.workbook, Some(PathBuf::from("out/report.xlsx")));
        assert_eq!(targets.csv_dir, None);

        let targets =
            ExportTargets::for_log(Path::new("site.log"), ExportFormat::Csv, None, None);
        assert_eq!(targets.workbook, None);
        assert_eq!(targets.csv_dir, Some(PathBuf::new()));
    }

    #[test]
    fn test_failed_workbook_does_not_skip_csv() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let mut aggregator = Aggregator::with_threshold(1.0);
        aggregator
            .ingest_line(r#"10.0.0.1 "GET /a HTTP/1.1" status=200 rt=0.2"#, &DirectOnly)
            .unwrap();
        let datasets = DatasetBuilder::build(&aggregator.finish()).unwrap();
        let targets = ExportTargets {
            workbook: Some(blocker.join("out.xlsx")),
            csv_dir: Some(temp_dir.path().join("csv")),
            stem: "access".to_string(),
        };

        let report = write_all(&datasets, &targets);
        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert!(format!("{:#}", report.failures[0]).starts_with("Excel export"));
        assert!(!report.written.is_empty());
        assert!(
            report
                .written
                .iter()
                .all(|p| p.starts_with(temp_dir.path().join("csv")))
        );
    }
}
