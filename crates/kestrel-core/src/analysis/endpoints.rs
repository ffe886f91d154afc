use super::status::status_description;
use super::{Analyzer, EndpointStats, StatusEndpointRow, StatusEndpoints};
use crate::Result;
use crate::aggregate::{Aggregates, EndpointBucket};
use crate::record::STATUS_CLIENT_CLOSED;
use crate::stats::percentage;

/// How endpoint rows are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRanking {
    /// Endpoint key order
    ByKey,
    /// Most requested first
    ByVolume,
    /// Highest mean response time first, ignoring endpoints with fewer than
    /// `min_samples` requests
    BySlowness { min_samples: usize },
}

pub struct EndpointAnalyzer {
    ranking: EndpointRanking,
    limit: Option<usize>,
}

impl EndpointAnalyzer {
    pub fn new(ranking: EndpointRanking, limit: Option<usize>) -> Self {
        Self { ranking, limit }
    }
}

impl Default for EndpointAnalyzer {
    fn default() -> Self {
        Self::new(EndpointRanking::ByKey, None)
    }
}

impl Analyzer for EndpointAnalyzer {
    type Output = Vec<EndpointStats>;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Analyzing endpoints ({:?})", self.ranking);

        let threshold = aggregates.threshold_secs();
        let buckets = aggregates.endpoints().values();

        let mut rows: Vec<EndpointStats> = match self.ranking {
            EndpointRanking::BySlowness { min_samples } => buckets
                .filter(|b| !b.is_empty() && b.len() >= min_samples)
                .map(|b| endpoint_stats(b, threshold))
                .collect(),
            _ => buckets.map(|b| endpoint_stats(b, threshold)).collect(),
        };

        // Stable sorts keep key order among equal rows
        match self.ranking {
            EndpointRanking::ByKey => {}
            EndpointRanking::ByVolume => rows.sort_by(|a, b| b.total.cmp(&a.total)),
            EndpointRanking::BySlowness { .. } => {
                rows.sort_by(|a, b| b.mean_time.total_cmp(&a.mean_time))
            }
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }
}

fn endpoint_stats(bucket: &EndpointBucket, threshold: f64) -> EndpointStats {
    let total = bucket.len();
    let slow = bucket.slow_count(threshold);
    let cdn = bucket.cdn_count();

    EndpointStats {
        endpoint: bucket.key().to_string(),
        method: bucket.key().method().to_string(),
        path: bucket.key().path().to_string(),
        total,
        cdn,
        direct: total - cdn,
        mean_time: bucket.mean_time(),
        max_time: bucket.max_time(),
        min_time: bucket.min_time(),
        errors_499: bucket.status_count(STATUS_CLIENT_CLOSED),
        requests_200: bucket.status_count(200),
        slow,
        slow_pct: percentage(slow, total),
        most_common_status: bucket.most_common_status(),
    }
}

/// Per-endpoint drill-down for a fixed list of status codes
pub struct StatusEndpointAnalyzer {
    statuses: Vec<u16>,
    top_n: Option<usize>,
}

impl StatusEndpointAnalyzer {
    pub fn new(statuses: Vec<u16>, top_n: Option<usize>) -> Self {
        Self { statuses, top_n }
    }
}

impl Analyzer for StatusEndpointAnalyzer {
    type Output = Vec<StatusEndpoints>;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Analyzing endpoints for statuses {:?}", self.statuses);

        let mut sections = Vec::new();

        for &status in &self.statuses {
            let Some(bucket) = aggregates.statuses().get(&status) else {
                continue;
            };
            if bucket.count == 0 {
                continue;
            }

            let mut rows: Vec<StatusEndpointRow> = bucket
                .by_endpoint
                .iter()
                .filter_map(|(key, &requests)| {
                    let endpoint = aggregates.endpoints().get(key)?;
                    Some(StatusEndpointRow {
                        endpoint: key.to_string(),
                        requests,
                        percentage: percentage(requests, bucket.count),
                        mean_time: endpoint.mean_time_for_status(status).unwrap_or(0.0),
                    })
                })
                .collect();

            rows.sort_by(|a, b| b.requests.cmp(&a.requests));
            if let Some(top_n) = self.top_n {
                rows.truncate(top_n);
            }

            sections.push(StatusEndpoints {
                status,
                description: status_description(status).map(str::to_string),
                total: bucket.count,
                endpoints: rows,
            });
        }

        Ok(sections)
    }
}
