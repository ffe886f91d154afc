mod endpoints;
mod general;
mod hourly;
mod origin;
mod run;
mod status;

pub use endpoints::{EndpointAnalyzer, EndpointRanking, StatusEndpointAnalyzer};
pub use general::GeneralAnalyzer;
pub use hourly::HourlyAnalyzer;
pub use origin::OriginAnalyzer;
pub use run::RunAnalyzer;
pub use status::{StatusAnalyzer, status_description};

use crate::aggregate::Aggregates;
use crate::stats::Distribution;
use crate::threshold::ResolvedThreshold;
use serde::{Deserialize, Serialize};

/// Status codes that get a per-endpoint drill-down
pub const INTERESTING_STATUSES: &[u16] = &[200, 202, 400, 404, 499, 500];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run: RunStats,
    pub general: GeneralStats,
    pub statuses: Vec<StatusRow>,
    pub origins: OriginComparison,
    pub status_endpoints: Vec<StatusEndpoints>,
    pub top_endpoints: Vec<EndpointStats>,
    pub slowest_endpoints: Vec<EndpointStats>,
    pub hourly: Vec<HourlyRow>,
}

impl AnalysisReport {
    /// Run every analyzer over `aggregates`
    pub fn build(aggregates: &Aggregates, options: &AnalyzerOptions) -> crate::Result<Self> {
        tracing::debug!("Building analysis report");

        Ok(AnalysisReport {
            run: RunAnalyzer.analyze(aggregates)?,
            general: GeneralAnalyzer.analyze(aggregates)?,
            statuses: StatusAnalyzer.analyze(aggregates)?,
            origins: OriginAnalyzer.analyze(aggregates)?,
            status_endpoints: StatusEndpointAnalyzer::new(
                options.interesting_statuses.clone(),
                options.status_top_n,
            )
            .analyze(aggregates)?,
            top_endpoints: EndpointAnalyzer::new(EndpointRanking::ByVolume, options.top_endpoints)
                .analyze(aggregates)?,
            slowest_endpoints: EndpointAnalyzer::new(
                EndpointRanking::BySlowness {
                    min_samples: options.slowest_min_samples,
                },
                options.slowest_endpoints,
            )
            .analyze(aggregates)?,
            hourly: HourlyAnalyzer.analyze(aggregates)?,
        })
    }
}

/// Sizes of the ranked views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    pub top_endpoints: Option<usize>,
    pub slowest_endpoints: Option<usize>,
    /// Endpoints with fewer requests are left out of the slowest ranking
    pub slowest_min_samples: usize,
    pub status_top_n: Option<usize>,
    pub interesting_statuses: Vec<u16>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            top_endpoints: Some(25),
            slowest_endpoints: Some(15),
            slowest_min_samples: 10,
            status_top_n: Some(15),
            interesting_statuses: INTERESTING_STATUSES.to_vec(),
        }
    }
}

impl AnalyzerOptions {
    /// Larger, less filtered views meant for spreadsheets
    pub fn export() -> Self {
        Self {
            top_endpoints: Some(50),
            slowest_endpoints: Some(50),
            slowest_min_samples: 5,
            status_top_n: None,
            interesting_statuses: INTERESTING_STATUSES.to_vec(),
        }
    }

    pub fn with_top_endpoints(mut self, top: usize) -> Self {
        self.top_endpoints = Some(top);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub total_lines: usize,
    pub parsed_lines: usize,
    pub skipped_lines: usize,
    pub parsed_pct: f64,
    pub unique_endpoints: usize,
    pub threshold: ResolvedThreshold,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub duration_secs: Option<i64>,
    pub duration_display: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralStats {
    pub total: usize,
    pub slow: usize,
    pub slow_pct: f64,
    pub error_499: usize,
    pub error_499_pct: f64,
    pub cdn: usize,
    pub cdn_pct: f64,
    pub direct: usize,
    pub direct_pct: f64,
    pub response_times: Distribution,
    pub cdn_response_times: Distribution,
    pub direct_response_times: Distribution,
    pub error_499_response_times: Distribution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRow {
    pub status: u16,
    pub description: Option<String>,
    pub total: usize,
    pub percentage: f64,
    pub cdn: usize,
    pub direct: usize,
    pub mean_time: f64,
}

/// One metric counted on each side of the CDN / direct split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginMetric {
    pub metric: String,
    pub cdn: usize,
    pub direct: usize,
    pub difference: i64,
    pub cdn_pct: f64,
    pub direct_pct: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OriginTimes {
    pub cdn: f64,
    pub direct: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginComparison {
    pub total: OriginMetric,
    pub slow: OriginMetric,
    pub error_499: OriginMetric,
    /// Only when both sides saw traffic
    pub mean_time: Option<OriginTimes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub total: usize,
    pub cdn: usize,
    pub direct: usize,
    pub mean_time: f64,
    pub max_time: f64,
    pub min_time: f64,
    pub errors_499: usize,
    pub requests_200: usize,
    pub slow: usize,
    pub slow_pct: f64,
    pub most_common_status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEndpointRow {
    pub endpoint: String,
    pub requests: usize,
    /// Share of all requests with this status
    pub percentage: f64,
    pub mean_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEndpoints {
    pub status: u16,
    pub description: Option<String>,
    pub total: usize,
    pub endpoints: Vec<StatusEndpointRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyRow {
    /// Two-digit hour of day
    pub hour: String,
    pub total: usize,
    pub cdn: usize,
    pub direct: usize,
    pub slow: usize,
    pub error_499: usize,
    pub mean_time: f64,
    pub slow_pct: f64,
    pub error_499_pct: f64,
}

pub trait Analyzer {
    type Output;

    fn analyze(&self, aggregates: &Aggregates) -> crate::Result<Self::Output>;
}
