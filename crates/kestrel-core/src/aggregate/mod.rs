mod buckets;

pub use buckets::{
    EndpointBucket, HourlyBucket, OriginSplit, RunSummary, StatusBucket, format_duration,
};

use crate::origin::OriginClassifier;
use crate::parser::{LineParser, ParseError};
use crate::record::{EndpointKey, HourBucket, RequestRecord};
use crate::threshold::{ResolvedThreshold, ThresholdAdvisor};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Folds request records into endpoint, hourly and status groupings.
///
/// Built with an explicit threshold, slow counters are maintained as records
/// arrive. Built without one, the threshold is suggested in [`finish`] and the
/// slow counters are derived from the stored records at that point.
///
/// [`finish`]: Aggregator::finish
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    threshold: Option<f64>,
    endpoints: BTreeMap<EndpointKey, EndpointBucket>,
    hourly: BTreeMap<u8, HourlyBucket>,
    statuses: BTreeMap<u16, StatusBucket>,
    origins: OriginSplit,
    summary: RunSummary,
}

impl Aggregator {
    /// Aggregator whose slow threshold is suggested once all records are in
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(seconds: f64) -> Self {
        Self {
            threshold: Some(seconds),
            ..Self::default()
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Parse, classify and fold one raw line. Returns the parse failure, if any,
    /// after counting it as a skipped line.
    pub fn ingest_line(
        &mut self,
        line: &str,
        classifier: &dyn OriginClassifier,
    ) -> std::result::Result<(), ParseError> {
        match LineParser::parse(line) {
            Ok(parsed) => {
                let origin = classifier.classify(line, parsed.source);
                self.push(parsed.into_record(origin));
                Ok(())
            }
            Err(e) => {
                self.skip(&e);
                Err(e)
            }
        }
    }

    /// Count a line that could not be parsed
    pub fn skip(&mut self, error: &ParseError) {
        tracing::trace!("Skipping line {}: {}", self.summary.total_lines + 1, error);
        self.summary.total_lines += 1;
    }

    pub fn push(&mut self, record: RequestRecord) {
        self.summary.total_lines += 1;
        self.summary.parsed_lines += 1;
        self.summary.observe(record.timestamp.as_ref());

        let key = record.endpoint();

        self.statuses
            .entry(record.status)
            .or_default()
            .record(&key);

        if let HourBucket::Hour(hour) = record.hour_bucket {
            self.hourly
                .entry(hour)
                .or_default()
                .record(&record, self.threshold);
        }

        self.origins.record(record.origin);

        self.endpoints
            .entry(key.clone())
            .or_insert_with(|| EndpointBucket::new(key))
            .push(record);
    }

    /// Fold a partial aggregate built over a later part of the same input.
    ///
    /// Records of `other` are appended after this aggregator's records so
    /// merging shards in input order reproduces a single pass.
    pub fn merge(&mut self, other: Aggregator) -> Result<()> {
        if self.threshold != other.threshold {
            return Err(Error::Aggregation(format!(
                "cannot merge aggregates built with thresholds {:?} and {:?}",
                self.threshold, other.threshold
            )));
        }

        for (key, bucket) in other.endpoints {
            match self.endpoints.get_mut(&key) {
                Some(existing) => existing.append(bucket),
                None => {
                    self.endpoints.insert(key, bucket);
                }
            }
        }
        for (hour, bucket) in other.hourly {
            self.hourly.entry(hour).or_default().merge(&bucket);
        }
        for (status, bucket) in other.statuses {
            self.statuses.entry(status).or_default().merge(bucket);
        }
        self.origins.cdn += other.origins.cdn;
        self.origins.direct += other.origins.direct;
        self.summary.merge(other.summary);

        Ok(())
    }

    /// Resolve the slow threshold and freeze the aggregates
    pub fn finish(mut self) -> Aggregates {
        let threshold = match self.threshold {
            Some(seconds) => ResolvedThreshold::explicit(seconds),
            None => {
                let times: Vec<f64> = self
                    .endpoints
                    .values()
                    .flat_map(|b| b.records().iter().map(|r| r.response_time))
                    .collect();
                let resolved = ResolvedThreshold::advised(ThresholdAdvisor::advise(&times));
                self.recount_slow(resolved.seconds);
                resolved
            }
        };

        tracing::info!(
            "Aggregated {} of {} lines into {} endpoints (threshold {:.2}s)",
            self.summary.parsed_lines,
            self.summary.total_lines,
            self.endpoints.len(),
            threshold.seconds
        );

        Aggregates {
            threshold,
            endpoints: self.endpoints,
            hourly: self.hourly,
            statuses: self.statuses,
            origins: self.origins,
            summary: self.summary,
        }
    }

    fn recount_slow(&mut self, threshold: f64) {
        for bucket in self.hourly.values_mut() {
            bucket.slow = 0;
        }
        for record in self.endpoints.values().flat_map(|b| b.records()) {
            if let HourBucket::Hour(hour) = record.hour_bucket
                && record.is_slow(threshold)
                && let Some(bucket) = self.hourly.get_mut(&hour)
            {
                bucket.slow += 1;
            }
        }
    }
}

/// Frozen result of a run: every grouping plus the threshold slow counts use
#[derive(Debug, Clone)]
pub struct Aggregates {
    threshold: ResolvedThreshold,
    endpoints: BTreeMap<EndpointKey, EndpointBucket>,
    hourly: BTreeMap<u8, HourlyBucket>,
    statuses: BTreeMap<u16, StatusBucket>,
    origins: OriginSplit,
    summary: RunSummary,
}

impl Aggregates {
    pub fn threshold(&self) -> &ResolvedThreshold {
        &self.threshold
    }

    pub fn threshold_secs(&self) -> f64 {
        self.threshold.seconds
    }

    pub fn endpoints(&self) -> &BTreeMap<EndpointKey, EndpointBucket> {
        &self.endpoints
    }

    pub fn endpoint(&self, method: &str, path: &str) -> Option<&EndpointBucket> {
        self.endpoints.get(&EndpointKey::new(method, path))
    }

    /// Hourly counters keyed by hour of day, ascending
    pub fn hourly(&self) -> &BTreeMap<u8, HourlyBucket> {
        &self.hourly
    }

    /// Status counters keyed by code, ascending
    pub fn statuses(&self) -> &BTreeMap<u16, StatusBucket> {
        &self.statuses
    }

    pub fn origins(&self) -> &OriginSplit {
        &self.origins
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Every accepted record, endpoint by endpoint
    pub fn records(&self) -> impl Iterator<Item = &RequestRecord> {
        self.endpoints.values().flat_map(|b| b.records().iter())
    }

    pub fn total_requests(&self) -> usize {
        self.summary.parsed_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Origin;

    fn marker_classifier(line: &str, _source: Option<&str>) -> Origin {
        if line.contains("cf-node") {
            Origin::Cdn
        } else {
            Origin::Direct
        }
    }

    const LINES: &[&str] = &[
        r#"10.0.0.1 - - [25/Sep/2025:09:00:01 -0600] "GET /a HTTP/1.1" status=200 rt=0.050"#,
        r#"10.0.0.2 - - [25/Sep/2025:09:00:02 -0600] "GET /a?x=1 HTTP/1.1" status=499 rt=2.500 (cf-node)"#,
        r#"10.0.0.3 - - [25/Sep/2025:10:00:03 -0600] "GET /b HTTP/1.1" rt=0.5"#,
        r#"10.0.0.4 - - "POST /b HTTP/1.1" status=500 rt=1.200"#,
        r#"10.0.0.5 - - [25/Sep/2025:11:30:00 -0600] "GET /b HTTP/1.1" status=200 rt=0.700"#,
    ];

    fn run(lines: &[&str], mut aggregator: Aggregator) -> Aggregates {
        for line in lines {
            let _ = aggregator.ingest_line(line, &marker_classifier);
        }
        aggregator.finish()
    }

    #[test]
    fn test_ingest_counts_lines() {
        let aggregates = run(LINES, Aggregator::with_threshold(1.0));
        let summary = aggregates.summary();
        assert_eq!(summary.total_lines, 5);
        assert_eq!(summary.parsed_lines, 4);
        assert_eq!(summary.skipped_lines(), 1);
        assert_eq!(
            summary.first_timestamp.as_ref().unwrap().raw,
            "25/Sep/2025:09:00:01 -0600"
        );
        assert_eq!(
            summary.last_timestamp.as_ref().unwrap().raw,
            "25/Sep/2025:11:30:00 -0600"
        );
        assert_eq!(summary.duration_secs(), Some(2 * 3600 + 29 * 60 + 59));
    }

    #[test]
    fn test_every_record_lands_in_one_endpoint_and_status() {
        let aggregates = run(LINES, Aggregator::with_threshold(1.0));

        let endpoint_total: usize = aggregates.endpoints().values().map(|b| b.len()).sum();
        let status_total: usize = aggregates.statuses().values().map(|b| b.count).sum();
        assert_eq!(endpoint_total, 4);
        assert_eq!(status_total, 4);

        let a = aggregates.endpoint("GET", "/a").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.cdn_count(), 1);
        assert_eq!(aggregates.statuses()[&499].by_endpoint[a.key()], 1);
    }

    #[test]
    fn test_record_without_timestamp_skips_hourly() {
        let aggregates = run(LINES, Aggregator::with_threshold(1.0));
        let hourly_total: usize = aggregates.hourly().values().map(|b| b.total).sum();
        // POST /b has no timestamp
        assert_eq!(hourly_total, 3);
        assert_eq!(aggregates.hourly().keys().copied().collect::<Vec<_>>(), vec![9, 11]);
        assert_eq!(aggregates.hourly()[&9].slow, 1);
        assert_eq!(aggregates.hourly()[&9].error_499, 1);
        assert_eq!(aggregates.hourly()[&9].cdn, 1);
        assert_eq!(aggregates.hourly()[&9].direct, 1);
    }

    #[test]
    fn test_missing_status_mutates_nothing() {
        let mut aggregator = Aggregator::with_threshold(1.0);
        let result = aggregator.ingest_line(LINES[2], &marker_classifier);
        assert_eq!(result, Err(ParseError::MissingStatus));

        let aggregates = aggregator.finish();
        assert_eq!(aggregates.summary().total_lines, 1);
        assert_eq!(aggregates.summary().parsed_lines, 0);
        assert!(aggregates.endpoints().is_empty());
        assert!(aggregates.statuses().is_empty());
        assert!(aggregates.hourly().is_empty());
        assert_eq!(aggregates.origins().total(), 0);
        assert!(aggregates.summary().first_timestamp.is_none());
    }

    #[test]
    fn test_deferred_threshold_matches_explicit() {
        let deferred = run(LINES, Aggregator::new());
        let resolved = deferred.threshold_secs();
        assert!(!deferred.threshold().is_explicit());

        let explicit = run(LINES, Aggregator::with_threshold(resolved));
        assert_eq!(deferred.hourly(), explicit.hourly());
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let single = run(LINES, Aggregator::with_threshold(1.0));

        let mut first = Aggregator::with_threshold(1.0);
        for line in &LINES[..2] {
            let _ = first.ingest_line(line, &marker_classifier);
        }
        let mut second = Aggregator::with_threshold(1.0);
        for line in &LINES[2..] {
            let _ = second.ingest_line(line, &marker_classifier);
        }
        first.merge(second).unwrap();
        let merged = first.finish();

        assert_eq!(merged.summary(), single.summary());
        assert_eq!(merged.endpoints(), single.endpoints());
        assert_eq!(merged.statuses(), single.statuses());
        assert_eq!(merged.origins(), single.origins());
        for (hour, bucket) in single.hourly() {
            let other = &merged.hourly()[hour];
            assert_eq!(other.total, bucket.total);
            assert_eq!(other.slow, bucket.slow);
            assert!((other.mean_time() - bucket.mean_time()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_merge_rejects_mismatched_thresholds() {
        let mut first = Aggregator::with_threshold(1.0);
        assert!(first.merge(Aggregator::new()).is_err());
    }
}
