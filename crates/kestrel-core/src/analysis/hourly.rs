use super::{Analyzer, HourlyRow};
use crate::Result;
use crate::aggregate::Aggregates;
use crate::record::HourBucket;
use crate::stats::percentage;

pub struct HourlyAnalyzer;

impl Analyzer for HourlyAnalyzer {
    type Output = Vec<HourlyRow>;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Analyzing hourly distribution");

        let rows = aggregates
            .hourly()
            .iter()
            .map(|(&hour, bucket)| HourlyRow {
                hour: HourBucket::Hour(hour).label(),
                total: bucket.total,
                cdn: bucket.cdn,
                direct: bucket.direct,
                slow: bucket.slow,
                error_499: bucket.error_499,
                mean_time: bucket.mean_time(),
                slow_pct: percentage(bucket.slow, bucket.total),
                error_499_pct: percentage(bucket.error_499, bucket.total),
            })
            .collect();

        Ok(rows)
    }
}
