use crate::record::{EndpointKey, Origin, RequestRecord, Timestamp};
use crate::stats::mean;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All records that share an endpoint key, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointBucket {
    key: EndpointKey,
    records: Vec<RequestRecord>,
}

impl EndpointBucket {
    pub fn new(key: EndpointKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: RequestRecord) {
        self.records.push(record);
    }

    pub(crate) fn append(&mut self, other: EndpointBucket) {
        self.records.extend(other.records);
    }

    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn response_times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.response_time).collect()
    }

    pub fn mean_time(&self) -> f64 {
        mean(&self.response_times()).unwrap_or(0.0)
    }

    pub fn max_time(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.response_time)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    pub fn min_time(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.response_time)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn cdn_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_cdn()).count()
    }

    pub fn direct_count(&self) -> usize {
        self.len() - self.cdn_count()
    }

    pub fn slow_count(&self, threshold: f64) -> usize {
        self.records.iter().filter(|r| r.is_slow(threshold)).count()
    }

    pub fn status_count(&self, status: u16) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Mean response time of this endpoint's requests that returned `status`
    pub fn mean_time_for_status(&self, status: u16) -> Option<f64> {
        let times: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.response_time)
            .collect();
        mean(&times)
    }

    pub fn status_histogram(&self) -> BTreeMap<u16, usize> {
        let mut histogram = BTreeMap::new();
        for record in &self.records {
            *histogram.entry(record.status).or_insert(0) += 1;
        }
        histogram
    }

    /// Most frequent status; the lowest code wins a tie
    pub fn most_common_status(&self) -> Option<u16> {
        self.status_histogram()
            .into_iter()
            .fold(None, |best: Option<(u16, usize)>, (code, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((code, count)),
            })
            .map(|(code, _)| code)
    }
}

/// Running counters for one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub total: usize,
    pub slow: usize,
    pub error_499: usize,
    pub cdn: usize,
    pub direct: usize,
    pub response_time_sum: f64,
}

impl HourlyBucket {
    /// Count `record`. `threshold` is `None` while the slow cutoff is still unknown.
    pub(crate) fn record(&mut self, record: &RequestRecord, threshold: Option<f64>) {
        self.total += 1;
        self.response_time_sum += record.response_time;
        if threshold.is_some_and(|t| record.is_slow(t)) {
            self.slow += 1;
        }
        if record.is_client_closed() {
            self.error_499 += 1;
        }
        match record.origin {
            Origin::Cdn => self.cdn += 1,
            Origin::Direct => self.direct += 1,
        }
    }

    pub(crate) fn merge(&mut self, other: &HourlyBucket) {
        self.total += other.total;
        self.slow += other.slow;
        self.error_499 += other.error_499;
        self.cdn += other.cdn;
        self.direct += other.direct;
        self.response_time_sum += other.response_time_sum;
    }

    pub fn mean_time(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.response_time_sum / self.total as f64
        }
    }
}

/// Count of one status code, with a per-endpoint drill-down
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusBucket {
    pub count: usize,
    pub by_endpoint: BTreeMap<EndpointKey, usize>,
}

impl StatusBucket {
    pub(crate) fn record(&mut self, endpoint: &EndpointKey) {
        self.count += 1;
        *self.by_endpoint.entry(endpoint.clone()).or_insert(0) += 1;
    }

    pub(crate) fn merge(&mut self, other: StatusBucket) {
        self.count += other.count;
        for (endpoint, count) in other.by_endpoint {
            *self.by_endpoint.entry(endpoint).or_insert(0) += count;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OriginSplit {
    pub cdn: usize,
    pub direct: usize,
}

impl OriginSplit {
    pub(crate) fn record(&mut self, origin: Origin) {
        match origin {
            Origin::Cdn => self.cdn += 1,
            Origin::Direct => self.direct += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.cdn + self.direct
    }
}

/// Line accounting and the observed time span of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunSummary {
    /// First valid timestamp in input order
    pub first_timestamp: Option<Timestamp>,
    /// Last valid timestamp in input order
    pub last_timestamp: Option<Timestamp>,
    pub total_lines: usize,
    pub parsed_lines: usize,
}

impl RunSummary {
    pub fn skipped_lines(&self) -> usize {
        self.total_lines - self.parsed_lines
    }

    pub(crate) fn observe(&mut self, timestamp: Option<&Timestamp>) {
        if let Some(ts) = timestamp {
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(ts.clone());
            }
            self.last_timestamp = Some(ts.clone());
        }
    }

    /// Seconds between the first and last timestamp, `None` if either is
    /// missing or the log runs backwards
    pub fn duration_secs(&self) -> Option<i64> {
        let first = self.first_timestamp.as_ref()?;
        let last = self.last_timestamp.as_ref()?;
        let secs = last
            .instant
            .signed_duration_since(first.instant)
            .num_seconds();
        (secs >= 0).then_some(secs)
    }

    pub(crate) fn merge(&mut self, other: RunSummary) {
        self.total_lines += other.total_lines;
        self.parsed_lines += other.parsed_lines;
        if self.first_timestamp.is_none() {
            self.first_timestamp = other.first_timestamp;
        }
        if other.last_timestamp.is_some() {
            self.last_timestamp = other.last_timestamp;
        }
    }
}

/// `1 day, 2 hours, 5 seconds`; zero renders as `0 seconds`
pub fn format_duration(total_secs: i64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    for (value, unit) in [(days, "day"), (hours, "hour"), (minutes, "minute")] {
        if value > 0 {
            parts.push(plural(value, unit));
        }
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(plural(seconds, "second"));
    }
    parts.join(", ")
}

fn plural(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HourBucket;

    fn record(status: u16, rt: f64, origin: Origin) -> RequestRecord {
        RequestRecord {
            method: "GET".to_string(),
            path: "/a".to_string(),
            status,
            response_time: rt,
            timestamp: None,
            hour_bucket: HourBucket::Unknown,
            origin,
        }
    }

    #[test]
    fn test_endpoint_bucket_stats() {
        let mut bucket = EndpointBucket::new(EndpointKey::new("GET", "/a"));
        bucket.push(record(200, 0.1, Origin::Cdn));
        bucket.push(record(499, 2.5, Origin::Direct));
        bucket.push(record(200, 0.3, Origin::Direct));

        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.cdn_count(), 1);
        assert_eq!(bucket.direct_count(), 2);
        assert_eq!(bucket.slow_count(1.0), 1);
        assert_eq!(bucket.status_count(499), 1);
        assert_eq!(bucket.max_time(), 2.5);
        assert_eq!(bucket.min_time(), 0.1);
        assert_eq!(bucket.most_common_status(), Some(200));
        assert!((bucket.mean_time_for_status(200).unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(bucket.mean_time_for_status(404), None);
    }

    #[test]
    fn test_most_common_status_tie_prefers_lowest() {
        let mut bucket = EndpointBucket::new(EndpointKey::new("GET", "/a"));
        bucket.push(record(500, 0.1, Origin::Direct));
        bucket.push(record(404, 0.1, Origin::Direct));
        assert_eq!(bucket.most_common_status(), Some(404));
    }

    #[test]
    fn test_hourly_bucket_without_threshold_skips_slow() {
        let mut hourly = HourlyBucket::default();
        hourly.record(&record(499, 5.0, Origin::Cdn), None);
        assert_eq!(hourly.total, 1);
        assert_eq!(hourly.slow, 0);
        assert_eq!(hourly.error_499, 1);
        assert_eq!(hourly.cdn, 1);

        hourly.record(&record(200, 5.0, Origin::Direct), Some(1.0));
        assert_eq!(hourly.slow, 1);
        assert_eq!(hourly.mean_time(), 5.0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(3_725), "1 hour, 2 minutes, 5 seconds");
        assert_eq!(format_duration(2 * 86_400 + 60), "2 days, 1 minute");
    }
}
