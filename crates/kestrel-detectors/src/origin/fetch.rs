use super::ranges::CdnRanges;
use crate::{Error, Result};
use ipnet::IpNet;
use std::time::{Duration, Instant};

pub const CLOUDFLARE_IPV4_URL: &str = "https://www.cloudflare.com/ips-v4";
pub const CLOUDFLARE_IPV6_URL: &str = "https://www.cloudflare.com/ips-v6";
/// Budget for downloading every list, not for each request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can produce a current CDN range list
pub trait RangeSource {
    fn fetch(&self) -> Result<Vec<IpNet>>;
}

/// Downloads the published plain-text range lists
pub struct RangeFetcher {
    client: reqwest::blocking::Client,
    urls: Vec<String>,
    timeout: Duration,
}

impl RangeFetcher {
    pub fn new() -> Result<Self> {
        Self::with_urls(vec![
            CLOUDFLARE_IPV4_URL.to_string(),
            CLOUDFLARE_IPV6_URL.to_string(),
        ])
    }

    pub fn with_urls(urls: Vec<String>) -> Result<Self> {
        Self::with_timeout(urls, FETCH_TIMEOUT)
    }

    pub fn with_timeout(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            urls,
            timeout,
        })
    }

    fn fetch_one(&self, url: &str, remaining: Duration) -> Result<Vec<IpNet>> {
        tracing::debug!("Fetching CDN ranges from {} ({:?} left)", url, remaining);

        let body = self
            .client
            .get(url)
            .timeout(remaining)
            .send()?
            .error_for_status()?
            .text()?;

        let ranges = CdnRanges::parse_list(&body);
        if ranges.is_empty() {
            return Err(Error::EmptyRangeList(url.to_string()));
        }
        Ok(ranges)
    }
}

impl RangeSource for RangeFetcher {
    /// Every list must load within one shared deadline; a partial table is
    /// never returned
    fn fetch(&self) -> Result<Vec<IpNet>> {
        let deadline = Instant::now() + self.timeout;
        let mut ranges = Vec::new();
        for url in &self.urls {
            let remaining = remaining_until(deadline, Instant::now())
                .ok_or(Error::DeadlineExceeded(self.timeout))?;
            ranges.extend(self.fetch_one(url, remaining)?);
        }
        Ok(ranges)
    }
}

/// Time left before `deadline`, or `None` once it has passed
fn remaining_until(deadline: Instant, now: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(now);
    (!left.is_zero()).then_some(left)
}
