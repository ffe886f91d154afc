use ipnet::IpNet;
use kestrel_core::log::LogReader;
use kestrel_core::origin::OriginClassifier;
use kestrel_core::record::Origin;
use kestrel_detectors::origin::{RangeOrigin, parse_range};
use kestrel_detectors::{CdnClassifier, CdnRanges, Error, RangeFetcher, RangeSource, Result};
use std::path::PathBuf;
use std::net::TcpListener;
use std::time::{Duration, Instant};

/// Helper to get path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(filename)
}

struct StaticSource(Vec<&'static str>);

impl RangeSource for StaticSource {
    fn fetch(&self) -> Result<Vec<IpNet>> {
        Ok(self.0.iter().map(|r| parse_range(r).unwrap()).collect())
    }
}

struct FailingSource;

impl RangeSource for FailingSource {
    fn fetch(&self) -> Result<Vec<IpNet>> {
        Err(Error::EmptyRangeList("test".to_string()))
    }
}

#[test]
fn test_documented_cdn_address_is_cdn() {
    let classifier = CdnClassifier::default();
    let line = r#"173.245.48.10 - - [25/Sep/2025:08:00:00 -0600] "GET / HTTP/1.1" status=200"#;
    assert_eq!(classifier.classify(line, Some("173.245.48.10")), Origin::Cdn);
}

#[test]
fn test_outside_address_without_marker_is_direct() {
    let classifier = CdnClassifier::default();
    let line = r#"198.51.100.7 - - [25/Sep/2025:08:00:00 -0600] "GET / HTTP/1.1" status=200"#;
    assert_eq!(classifier.classify(line, Some("198.51.100.7")), Origin::Direct);
}

#[test]
fn test_fetched_table_replaces_builtin() {
    let ranges = CdnRanges::resolve_with(&StaticSource(vec!["192.0.2.0/24"]));
    assert_eq!(ranges.origin(), RangeOrigin::Fetched);
    assert_eq!(ranges.len(), 1);

    let classifier = CdnClassifier::new(ranges);
    assert_eq!(classifier.classify("", Some("192.0.2.9")), Origin::Cdn);
    assert_eq!(classifier.classify("", Some("173.245.48.10")), Origin::Direct);
}

#[test]
fn test_failed_fetch_falls_back_to_builtin() {
    let ranges = CdnRanges::resolve_with(&FailingSource);
    assert_eq!(ranges, CdnRanges::builtin());
}

#[test]
fn test_empty_fetch_falls_back_to_builtin() {
    let ranges = CdnRanges::resolve_with(&StaticSource(vec![]));
    assert_eq!(ranges.origin(), RangeOrigin::Builtin);
}

#[test]
fn test_unreachable_endpoint_falls_back_to_builtin() {
    let fetcher = RangeFetcher::with_timeout(
        vec!["http://127.0.0.1:9/ips-v4".to_string()],
        Duration::from_millis(500),
    )
    .unwrap();

    assert!(fetcher.fetch().is_err());
    assert_eq!(CdnRanges::resolve_with(&fetcher), CdnRanges::builtin());
}

#[test]
fn test_stalled_lists_share_one_deadline() {
    // Accepts connections into the backlog but never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let budget = Duration::from_millis(500);

    let fetcher = RangeFetcher::with_timeout(
        vec![
            format!("http://{}/ips-v4", addr),
            format!("http://{}/ips-v6", addr),
        ],
        budget,
    )
    .unwrap();

    let started = Instant::now();
    assert!(fetcher.fetch().is_err());
    assert!(
        started.elapsed() < budget * 2,
        "fetch took {:?}",
        started.elapsed()
    );
    drop(listener);
}

#[test]
fn test_fixture_origin_split() {
    let classifier = CdnClassifier::default();
    let aggregates =
        LogReader::from_file(&fixture_path("access.log"), &classifier, Some(1.0)).unwrap();

    // 4 addresses in published ranges plus 3 marker lines
    assert_eq!(aggregates.origins().cdn, 7);
    assert_eq!(aggregates.origins().direct, 25);

    let cdn_by_hour: Vec<(u8, usize)> = aggregates
        .hourly()
        .iter()
        .map(|(hour, bucket)| (*hour, bucket.cdn))
        .collect();
    assert_eq!(cdn_by_hour, vec![(8, 3), (9, 2), (10, 2), (11, 0)]);

    let items = aggregates.endpoint("GET", "/api/items").unwrap();
    assert_eq!(items.cdn_count(), 4);
    assert_eq!(items.direct_count(), 9);
}

#[test]
fn test_ranges_serialize_as_cidr_strings() {
    let ranges = CdnRanges::from_ranges(
        vec![parse_range("192.0.2.0/24").unwrap()],
        RangeOrigin::Fetched,
    );
    let json = serde_json::to_value(&ranges).unwrap();
    assert_eq!(json["ranges"][0], "192.0.2.0/24");
    assert_eq!(json["origin"], "fetched");
}
