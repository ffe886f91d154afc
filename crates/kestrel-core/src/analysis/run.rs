use super::{Analyzer, RunStats};
use crate::Result;
use crate::aggregate::{Aggregates, format_duration};
use crate::record::Timestamp;
use crate::stats::percentage;

pub struct RunAnalyzer;

impl Analyzer for RunAnalyzer {
    type Output = RunStats;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        let summary = aggregates.summary();
        let duration_secs = summary.duration_secs();

        Ok(RunStats {
            total_lines: summary.total_lines,
            parsed_lines: summary.parsed_lines,
            skipped_lines: summary.skipped_lines(),
            parsed_pct: percentage(summary.parsed_lines, summary.total_lines),
            unique_endpoints: aggregates.endpoints().len(),
            threshold: *aggregates.threshold(),
            first_timestamp: summary.first_timestamp.as_ref().map(Timestamp::display),
            last_timestamp: summary.last_timestamp.as_ref().map(Timestamp::display),
            duration_secs,
            duration_display: duration_secs.map(format_duration),
        })
    }
}
