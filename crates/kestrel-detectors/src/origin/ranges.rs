use super::fetch::RangeSource;
use crate::{Error, Result};
use ipnet::IpNet;
use serde::Serialize;
use std::net::IpAddr;

/// Published Cloudflare edge ranges, used whenever a fresh list is unavailable
pub const BUILTIN_RANGES: &[&str] = &[
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/13",
    "104.24.0.0/14",
    "172.64.0.0/13",
    "131.0.72.0/22",
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

/// Where the active range table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOrigin {
    Builtin,
    Fetched,
}

/// CIDR table a source address is matched against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdnRanges {
    ranges: Vec<IpNet>,
    origin: RangeOrigin,
}

impl CdnRanges {
    pub fn builtin() -> Self {
        let ranges = BUILTIN_RANGES
            .iter()
            .filter_map(|r| r.parse::<IpNet>().ok())
            .collect();
        Self {
            ranges,
            origin: RangeOrigin::Builtin,
        }
    }

    pub fn from_ranges(ranges: Vec<IpNet>, origin: RangeOrigin) -> Self {
        Self { ranges, origin }
    }

    /// Built-in table, or the published one when `refresh` is set and the
    /// fetch succeeds.
    pub fn resolve(refresh: bool) -> Self {
        if !refresh {
            return Self::builtin();
        }
        match super::fetch::RangeFetcher::new() {
            Ok(fetcher) => Self::resolve_with(&fetcher),
            Err(e) => {
                tracing::warn!("{}; using built-in CDN ranges", e);
                Self::builtin()
            }
        }
    }

    /// Ask `source` for the current table, falling back to the built-in one
    pub fn resolve_with(source: &dyn RangeSource) -> Self {
        tracing::debug!("Refreshing CDN ranges");

        match source.fetch() {
            Ok(ranges) if !ranges.is_empty() => {
                tracing::info!("Loaded {} CDN ranges", ranges.len());
                Self::from_ranges(ranges, RangeOrigin::Fetched)
            }
            Ok(_) => {
                tracing::warn!("Fetched CDN range list was empty; using built-in ranges");
                Self::builtin()
            }
            Err(e) => {
                tracing::warn!("{}; using built-in CDN ranges", e);
                Self::builtin()
            }
        }
    }

    /// Parse a newline-separated list, skipping blank and unparseable lines
    pub fn parse_list(body: &str) -> Vec<IpNet> {
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match parse_range(line) {
                Ok(net) => Some(net),
                Err(e) => {
                    tracing::debug!("Ignoring range entry: {}", e);
                    None
                }
            })
            .collect()
    }

    pub fn extend(&mut self, extra: impl IntoIterator<Item = IpNet>) {
        for net in extra {
            if !self.ranges.contains(&net) {
                self.ranges.push(net);
            }
        }
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.ranges.iter().any(|net| net.contains(addr))
    }

    pub fn ranges(&self) -> &[IpNet] {
        &self.ranges
    }

    pub fn origin(&self) -> RangeOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl Default for CdnRanges {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Accepts `a.b.c.d/n`, IPv6 prefixes and bare addresses. Host bits are cleared.
pub fn parse_range(value: &str) -> Result<IpNet> {
    let value = value.trim();
    if let Ok(net) = value.parse::<IpNet>() {
        return Ok(net.trunc());
    }
    value
        .parse::<IpAddr>()
        .map(IpNet::from)
        .map_err(|_| Error::InvalidRange(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_builtin_table_parses_completely() {
        let ranges = CdnRanges::builtin();
        assert_eq!(ranges.len(), BUILTIN_RANGES.len());
        assert_eq!(ranges.origin(), RangeOrigin::Builtin);
    }

    #[test]
    fn test_builtin_membership() {
        let ranges = CdnRanges::builtin();
        assert!(ranges.contains(&ip("173.245.48.1")));
        assert!(ranges.contains(&ip("173.245.63.254")));
        assert!(!ranges.contains(&ip("173.245.64.1")));
        assert!(ranges.contains(&ip("2606:4700::6810:84e5")));
        assert!(!ranges.contains(&ip("198.51.100.7")));
        assert!(!ranges.contains(&ip("::1")));
    }

    #[test]
    fn test_parse_list_skips_garbage() {
        let body = "173.245.48.0/20\n\nnot-a-range\n  2400:cb00::/32  \n10.0.0.0/33\n";
        let parsed = CdnRanges::parse_list(body);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parse_range_forms() {
        assert_eq!(
            parse_range("10.1.2.3/8").unwrap(),
            "10.0.0.0/8".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_range("192.0.2.9").unwrap(),
            "192.0.2.9/32".parse::<IpNet>().unwrap()
        );
        assert!(matches!(
            parse_range("example.com"),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_extend_ignores_duplicates() {
        let mut ranges = CdnRanges::builtin();
        let before = ranges.len();
        ranges.extend(vec![
            parse_range("173.245.48.0/20").unwrap(),
            parse_range("192.0.2.0/24").unwrap(),
        ]);
        assert_eq!(ranges.len(), before + 1);
        assert!(ranges.contains(&ip("192.0.2.55")));
    }
}
