use super::{Analyzer, GeneralStats};
use crate::Result;
use crate::aggregate::Aggregates;
use crate::stats::{Distribution, percentage};

pub struct GeneralAnalyzer;

impl Analyzer for GeneralAnalyzer {
    type Output = GeneralStats;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Analyzing global request statistics");

        let threshold = aggregates.threshold_secs();

        let mut all = Vec::new();
        let mut cdn = Vec::new();
        let mut direct = Vec::new();
        let mut closed = Vec::new();
        let mut slow = 0;

        for record in aggregates.records() {
            all.push(record.response_time);
            if record.is_cdn() {
                cdn.push(record.response_time);
            } else {
                direct.push(record.response_time);
            }
            if record.is_client_closed() {
                closed.push(record.response_time);
            }
            if record.is_slow(threshold) {
                slow += 1;
            }
        }

        let total = all.len();

        tracing::info!(
            "General analysis complete: {} requests, {} slow, {} via CDN",
            total,
            slow,
            cdn.len()
        );

        Ok(GeneralStats {
            total,
            slow,
            slow_pct: percentage(slow, total),
            error_499: closed.len(),
            error_499_pct: percentage(closed.len(), total),
            cdn: cdn.len(),
            cdn_pct: percentage(cdn.len(), total),
            direct: direct.len(),
            direct_pct: percentage(direct.len(), total),
            response_times: Distribution::from_values(&all),
            cdn_response_times: Distribution::from_values(&cdn),
            direct_response_times: Distribution::from_values(&direct),
            error_499_response_times: Distribution::from_values(&closed),
        })
    }
}
