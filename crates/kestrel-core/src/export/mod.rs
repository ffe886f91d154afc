//! Tabular datasets handed to spreadsheet and CSV writers.
//!
//! Every dataset is a named table with fixed columns. Writers only format
//! cells; all numbers are computed here from the analysis views.

use crate::Result;
use crate::aggregate::Aggregates;
use crate::analysis::{
    AnalysisReport, Analyzer, AnalyzerOptions, EndpointAnalyzer, EndpointStats,
};
use serde::Serialize;
use std::fmt;

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn count(value: usize) -> Self {
        Cell::Int(value as i64)
    }

    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn seconds(value: f64) -> Self {
        Cell::Text(format!("{:.3}s", value))
    }

    fn pct(value: f64) -> Self {
        Cell::Text(format!("{:.1}%", value))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    fn new(name: &'static str, columns: &[&'static str]) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct DatasetBuilder;

impl DatasetBuilder {
    /// Build every export dataset, in workbook order
    pub fn build(aggregates: &Aggregates) -> Result<Vec<Dataset>> {
        tracing::debug!("Preparing export datasets");

        let report = AnalysisReport::build(aggregates, &AnalyzerOptions::export())?;
        let detail = EndpointAnalyzer::default().analyze(aggregates)?;

        let datasets = vec![
            processing_stats(&report),
            general_stats(&report),
            http_distribution(&report),
            cdn_vs_direct(&report),
            endpoints_by_code(&report),
            top_endpoints(&report.top_endpoints),
            hourly_analysis(&report),
            slow_endpoints(&report.slowest_endpoints),
            endpoint_detail(&detail),
        ];

        tracing::info!(
            "Prepared {} export datasets ({} non-empty)",
            datasets.len(),
            datasets.iter().filter(|d| !d.is_empty()).count()
        );

        Ok(datasets)
    }
}

const METRIC_COLUMNS: &[&str] = &["Metric", "Value", "Percentage"];

fn processing_stats(report: &AnalysisReport) -> Dataset {
    let run = &report.run;
    let mut data = Dataset::new("processing_stats", METRIC_COLUMNS);

    data.push(vec![
        Cell::text("Total lines in file"),
        Cell::count(run.total_lines),
        Cell::text("100%"),
    ]);
    data.push(vec![
        Cell::text("Lines parsed"),
        Cell::count(run.parsed_lines),
        Cell::pct(run.parsed_pct),
    ]);
    data.push(vec![
        Cell::text("Lines skipped"),
        Cell::count(run.skipped_lines),
        Cell::text("-"),
    ]);
    data.push(vec![
        Cell::text("Unique endpoints"),
        Cell::count(run.unique_endpoints),
        Cell::text("-"),
    ]);
    data.push(vec![
        Cell::text("Slow request threshold"),
        Cell::text(format!("{}s", run.threshold.seconds)),
        Cell::text(if run.threshold.is_explicit() {
            "explicit"
        } else {
            "suggested"
        }),
    ]);
    data.push(vec![
        Cell::text("Date range - start"),
        Cell::text(run.first_timestamp.as_deref().unwrap_or("Not available")),
        Cell::text("-"),
    ]);
    data.push(vec![
        Cell::text("Date range - end"),
        Cell::text(run.last_timestamp.as_deref().unwrap_or("Not available")),
        Cell::text("-"),
    ]);
    data
}

fn general_stats(report: &AnalysisReport) -> Dataset {
    let general = &report.general;
    let mut data = Dataset::new("general_stats", METRIC_COLUMNS);
    if general.total == 0 {
        return data;
    }

    let counts = [
        ("Total Requests", general.total, 100.0),
        ("Slow Requests", general.slow, general.slow_pct),
        ("499 Errors", general.error_499, general.error_499_pct),
        ("CDN Requests", general.cdn, general.cdn_pct),
        ("Direct Requests", general.direct, general.direct_pct),
    ];
    for (metric, value, pct) in counts {
        data.push(vec![Cell::text(metric), Cell::count(value), Cell::pct(pct)]);
    }

    let times = [
        ("Mean Response Time", general.response_times.mean),
        ("95th Percentile", general.response_times.p95),
        ("99th Percentile", general.response_times.p99),
        ("Mean Response Time (CDN)", general.cdn_response_times.mean),
        ("Mean Response Time (Direct)", general.direct_response_times.mean),
    ];
    for (metric, value) in times {
        data.push(vec![Cell::text(metric), Cell::seconds(value), Cell::text("-")]);
    }
    data
}

fn http_distribution(report: &AnalysisReport) -> Dataset {
    let mut data = Dataset::new(
        "http_distribution",
        &[
            "Status",
            "Description",
            "Requests",
            "Percentage",
            "Percentage_Value",
            "CDN",
            "Direct",
            "Mean_Time",
        ],
    );
    for row in &report.statuses {
        data.push(vec![
            Cell::Int(row.status as i64),
            Cell::text(row.description.as_deref().unwrap_or("")),
            Cell::count(row.total),
            Cell::pct(row.percentage),
            Cell::Float(row.percentage),
            Cell::count(row.cdn),
            Cell::count(row.direct),
            Cell::Float(row.mean_time),
        ]);
    }
    data
}

fn cdn_vs_direct(report: &AnalysisReport) -> Dataset {
    let origins = &report.origins;
    let mut data = Dataset::new(
        "cdn_vs_direct",
        &["Metric", "CDN", "Direct", "Difference", "CDN_Pct", "Direct_Pct"],
    );
    if origins.total.cdn + origins.total.direct == 0 {
        return data;
    }

    for metric in [&origins.total, &origins.slow, &origins.error_499] {
        data.push(vec![
            Cell::text(metric.metric.clone()),
            Cell::count(metric.cdn),
            Cell::count(metric.direct),
            Cell::Int(metric.difference),
            Cell::pct(metric.cdn_pct),
            Cell::pct(metric.direct_pct),
        ]);
    }
    if let Some(times) = &origins.mean_time {
        data.push(vec![
            Cell::text("Mean Response Time"),
            Cell::Float(times.cdn),
            Cell::Float(times.direct),
            Cell::Float(times.difference),
            Cell::text("-"),
            Cell::text("-"),
        ]);
    }
    data
}

fn endpoints_by_code(report: &AnalysisReport) -> Dataset {
    let mut data = Dataset::new(
        "endpoints_by_code",
        &[
            "Status",
            "Description",
            "Endpoint",
            "Requests",
            "Percentage",
            "Mean_Time",
        ],
    );
    for section in &report.status_endpoints {
        for row in &section.endpoints {
            data.push(vec![
                Cell::Int(section.status as i64),
                Cell::text(section.description.as_deref().unwrap_or("")),
                Cell::text(row.endpoint.clone()),
                Cell::count(row.requests),
                Cell::Float(row.percentage),
                Cell::Float(row.mean_time),
            ]);
        }
    }
    data
}

fn top_endpoints(rows: &[EndpointStats]) -> Dataset {
    let mut data = Dataset::new(
        "top_endpoints",
        &[
            "Endpoint",
            "Requests",
            "CDN",
            "Direct",
            "Mean_Time",
            "Max_Time",
            "Errors_499",
            "Slow",
            "Slow_Pct",
        ],
    );
    for ep in rows {
        data.push(vec![
            Cell::text(ep.endpoint.clone()),
            Cell::count(ep.total),
            Cell::count(ep.cdn),
            Cell::count(ep.direct),
            Cell::Float(ep.mean_time),
            Cell::Float(ep.max_time),
            Cell::count(ep.errors_499),
            Cell::count(ep.slow),
            Cell::Float(ep.slow_pct),
        ]);
    }
    data
}

fn hourly_analysis(report: &AnalysisReport) -> Dataset {
    let mut data = Dataset::new(
        "hourly_analysis",
        &[
            "Hour",
            "Requests",
            "CDN",
            "Direct",
            "Slow",
            "Errors_499",
            "Mean_Time",
            "Slow_Pct",
            "Errors_Pct",
        ],
    );
    for row in &report.hourly {
        data.push(vec![
            Cell::text(format!("{}:00", row.hour)),
            Cell::count(row.total),
            Cell::count(row.cdn),
            Cell::count(row.direct),
            Cell::count(row.slow),
            Cell::count(row.error_499),
            Cell::Float(row.mean_time),
            Cell::Float(row.slow_pct),
            Cell::Float(row.error_499_pct),
        ]);
    }
    data
}

fn slow_endpoints(rows: &[EndpointStats]) -> Dataset {
    let mut data = Dataset::new(
        "slow_endpoints",
        &[
            "Endpoint",
            "Requests",
            "Mean_Time",
            "Max_Time",
            "Slow",
            "Slow_Pct",
        ],
    );
    for ep in rows {
        data.push(vec![
            Cell::text(ep.endpoint.clone()),
            Cell::count(ep.total),
            Cell::Float(ep.mean_time),
            Cell::Float(ep.max_time),
            Cell::count(ep.slow),
            Cell::Float(ep.slow_pct),
        ]);
    }
    data
}

fn endpoint_detail(rows: &[EndpointStats]) -> Dataset {
    let mut data = Dataset::new(
        "endpoint_detail",
        &[
            "Endpoint",
            "Method",
            "Path",
            "Requests",
            "Mean_Time",
            "Max_Time",
            "Min_Time",
            "Most_Common_Status",
            "Errors_499",
            "Requests_200",
            "Slow",
            "CDN",
            "Direct",
        ],
    );
    for ep in rows {
        data.push(vec![
            Cell::text(ep.endpoint.clone()),
            Cell::text(ep.method.clone()),
            Cell::text(ep.path.clone()),
            Cell::count(ep.total),
            Cell::Float(ep.mean_time),
            Cell::Float(ep.max_time),
            Cell::Float(ep.min_time),
            Cell::Int(ep.most_common_status.map(i64::from).unwrap_or(0)),
            Cell::count(ep.errors_499),
            Cell::count(ep.requests_200),
            Cell::count(ep.slow),
            Cell::count(ep.cdn),
            Cell::count(ep.direct),
        ]);
    }
    data
}
