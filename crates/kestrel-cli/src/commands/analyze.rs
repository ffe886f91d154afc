use crate::export::{self, ExportReport, ExportTargets};
use crate::report;
use crate::{ExportFormat, OutputFormat};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use kestrel_core::aggregate::Aggregates;
use kestrel_core::analysis::{AnalysisReport, AnalyzerOptions};
use kestrel_core::export::DatasetBuilder;
use kestrel_core::log::LogReader;
use kestrel_core::origin::OriginClassifier;
use kestrel_core::threshold::validate_threshold;
use kestrel_detectors::origin::parse_range;
use kestrel_detectors::{CdnClassifier, CdnRanges};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Everything `kestrel analyze` accepts besides the log path
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub threshold: Option<f64>,
    pub refresh_cdn_ranges: bool,
    pub cdn_ranges: Vec<String>,
    pub cdn_marker: String,
    pub top: usize,
    pub export: Option<ExportFormat>,
    pub output: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub progress: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            refresh_cdn_ranges: false,
            cdn_ranges: Vec::new(),
            cdn_marker: kestrel_detectors::origin::DEFAULT_MARKER.to_string(),
            top: 25,
            export: None,
            output: None,
            csv_dir: None,
            progress: false,
        }
    }
}

pub struct AnalyzeOutcome {
    pub aggregates: Aggregates,
    pub report: AnalysisReport,
}

/// Resolve the CDN table once for the whole run and build the classifier
pub fn build_classifier(options: &AnalyzeOptions) -> Result<CdnClassifier> {
    let mut ranges = CdnRanges::resolve(options.refresh_cdn_ranges);

    let extra = options
        .cdn_ranges
        .iter()
        .map(|r| parse_range(r))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid --cdn-range value")?;
    ranges.extend(extra);

    tracing::debug!("Classifying origins against {} CDN ranges", ranges.len());

    Ok(CdnClassifier::new(ranges).with_marker(options.cdn_marker.clone()))
}

/// Read and aggregate a log file, then build the analysis report
pub fn analyze_log(
    file: &Path,
    classifier: &dyn OriginClassifier,
    threshold: Option<f64>,
    options: &AnalyzerOptions,
    progress: bool,
) -> Result<AnalyzeOutcome> {
    tracing::debug!("Reading access log: {}", file.display());

    if !file.exists() {
        return Err(kestrel_core::Error::NotFound(file.to_path_buf()).into());
    }
    let threshold = threshold.map(validate_threshold).transpose()?;

    let handle =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let size = handle.metadata().map(|m| m.len()).unwrap_or(0);

    let bar = if progress {
        progress_bar(size)
    } else {
        ProgressBar::hidden()
    };
    let aggregates = LogReader::from_reader(
        BufReader::new(bar.wrap_read(handle)),
        classifier,
        threshold,
    );
    bar.finish_and_clear();
    let aggregates = aggregates?;

    let report = AnalysisReport::build(&aggregates, options)?;

    Ok(AnalyzeOutcome { aggregates, report })
}

fn progress_bar(size: u64) -> ProgressBar {
    let bar = ProgressBar::new(size);
    if let Ok(template) =
        ProgressStyle::with_template("{spinner} Reading log [{bar:30}] {bytes}/{total_bytes}")
    {
        bar.set_style(template.progress_chars("=> "));
    }
    bar
}

pub fn execute(file: &Path, options: &AnalyzeOptions, format: OutputFormat) -> Result<()> {
    tracing::info!("Analyzing access log: {}", file.display());

    // Before any range download
    if !file.exists() {
        return Err(kestrel_core::Error::NotFound(file.to_path_buf()).into());
    }

    let classifier = build_classifier(options)?;
    let analyzer_options = AnalyzerOptions::default().with_top_endpoints(options.top);
    let progress = options.progress && format == OutputFormat::Pretty;

    let outcome = analyze_log(
        file,
        &classifier,
        options.threshold,
        &analyzer_options,
        progress,
    )?;

    match format {
        OutputFormat::Json => report::output_json(&outcome.report)?,
        OutputFormat::Table => report::output_table(&outcome.report)?,
        OutputFormat::Pretty => report::output_pretty(&outcome.report)?,
    }

    if let Some(export_format) = options.export {
        let targets = ExportTargets::for_log(
            file,
            export_format,
            options.output.clone(),
            options.csv_dir.clone(),
        );
        // The report is already out; a failed export does not fail the run
        let exported = run_export(&outcome.aggregates, &targets);
        for path in &exported.written {
            eprintln!("{} {}", style("Exported").green(), path.display());
        }
        for e in &exported.failures {
            tracing::error!("Export failed: {:#}", e);
            eprintln!("{} {:#}", style("Export failed:").red().bold(), e);
        }
    }

    Ok(())
}

fn run_export(aggregates: &Aggregates, targets: &ExportTargets) -> ExportReport {
    match DatasetBuilder::build(aggregates) {
        Ok(datasets) => export::write_all(&datasets, targets),
        Err(e) => ExportReport {
            written: Vec::new(),
            failures: vec![anyhow::Error::new(e).context("Preparing export datasets")],
        },
    }
}
