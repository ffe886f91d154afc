//! CDN edge detection.
//!
//! A line is CDN traffic when it carries the edge marker or when its source
//! address falls inside one of the CDN's published ranges. The range table is
//! resolved once per run and handed to [`CdnClassifier`]; classification itself
//! never touches the network.

mod fetch;
mod ranges;

pub use fetch::{
    CLOUDFLARE_IPV4_URL, CLOUDFLARE_IPV6_URL, FETCH_TIMEOUT, RangeFetcher, RangeSource,
};
pub use ranges::{BUILTIN_RANGES, CdnRanges, RangeOrigin, parse_range};

use kestrel_core::origin::OriginClassifier;
use kestrel_core::record::Origin;
use std::net::IpAddr;

pub const DEFAULT_MARKER: &str = "cf-node";

#[derive(Debug, Clone)]
pub struct CdnClassifier {
    marker: String,
    ranges: CdnRanges,
}

impl CdnClassifier {
    pub fn new(ranges: CdnRanges) -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            ranges,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn ranges(&self) -> &CdnRanges {
        &self.ranges
    }

    fn source_in_ranges(&self, source: Option<&str>) -> bool {
        source
            .and_then(|s| s.parse::<IpAddr>().ok())
            .is_some_and(|addr| self.ranges.contains(&addr))
    }
}

impl Default for CdnClassifier {
    fn default() -> Self {
        Self::new(CdnRanges::builtin())
    }
}

impl OriginClassifier for CdnClassifier {
    fn classify(&self, line: &str, source: Option<&str>) -> Origin {
        if !self.marker.is_empty() && line.contains(&self.marker) {
            return Origin::Cdn;
        }
        if self.source_in_ranges(source) {
            Origin::Cdn
        } else {
            Origin::Direct
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_wins_over_address() {
        let classifier = CdnClassifier::default();
        let line = r#"198.51.100.7 - - "GET / HTTP/1.1" status=200 (cf-node)"#;
        assert_eq!(classifier.classify(line, Some("198.51.100.7")), Origin::Cdn);
    }

    #[test]
    fn test_custom_marker() {
        let classifier = CdnClassifier::default().with_marker("edge=1");
        assert_eq!(classifier.classify("x edge=1", Some("10.0.0.1")), Origin::Cdn);
        assert_eq!(classifier.classify("x (cf-node)", Some("10.0.0.1")), Origin::Direct);
    }

    #[test]
    fn test_empty_marker_never_matches() {
        let classifier = CdnClassifier::default().with_marker("");
        assert_eq!(classifier.classify("anything", Some("10.0.0.1")), Origin::Direct);
    }

    #[test]
    fn test_unparseable_source_is_direct() {
        let classifier = CdnClassifier::default();
        assert_eq!(classifier.classify("-", Some("-")), Origin::Direct);
        assert_eq!(classifier.classify("", None), Origin::Direct);
    }
}
