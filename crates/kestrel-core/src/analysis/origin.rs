use super::{Analyzer, OriginComparison, OriginMetric, OriginTimes};
use crate::Result;
use crate::aggregate::Aggregates;
use crate::stats::{mean, percentage};

pub struct OriginAnalyzer;

impl Analyzer for OriginAnalyzer {
    type Output = OriginComparison;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Comparing CDN and direct traffic");

        let threshold = aggregates.threshold_secs();
        let split = aggregates.origins();

        let (mut cdn_slow, mut direct_slow) = (0, 0);
        let (mut cdn_499, mut direct_499) = (0, 0);
        let (mut cdn_times, mut direct_times) = (Vec::new(), Vec::new());

        for record in aggregates.records() {
            let slow = usize::from(record.is_slow(threshold));
            let closed = usize::from(record.is_client_closed());
            if record.is_cdn() {
                cdn_slow += slow;
                cdn_499 += closed;
                cdn_times.push(record.response_time);
            } else {
                direct_slow += slow;
                direct_499 += closed;
                direct_times.push(record.response_time);
            }
        }

        let total = OriginMetric {
            metric: "Total Requests".to_string(),
            cdn: split.cdn,
            direct: split.direct,
            difference: difference(split.cdn, split.direct),
            cdn_pct: percentage(split.cdn, split.total()),
            direct_pct: percentage(split.direct, split.total()),
        };

        let mean_time = match (mean(&cdn_times), mean(&direct_times)) {
            (Some(cdn), Some(direct)) => Some(OriginTimes {
                cdn,
                direct,
                difference: cdn - direct,
            }),
            _ => None,
        };

        Ok(OriginComparison {
            total,
            slow: share_metric("Slow Requests", cdn_slow, direct_slow, split.cdn, split.direct),
            error_499: share_metric("499 Errors", cdn_499, direct_499, split.cdn, split.direct),
            mean_time,
        })
    }
}

/// Metric whose percentages are relative to each side's own traffic
fn share_metric(
    name: &str,
    cdn: usize,
    direct: usize,
    cdn_total: usize,
    direct_total: usize,
) -> OriginMetric {
    OriginMetric {
        metric: name.to_string(),
        cdn,
        direct,
        difference: difference(cdn, direct),
        cdn_pct: percentage(cdn, cdn_total),
        direct_pct: percentage(direct, direct_total),
    }
}

fn difference(a: usize, b: usize) -> i64 {
    a as i64 - b as i64
}
