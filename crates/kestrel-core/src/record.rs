use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Format of the bracketed access log timestamp, e.g. `25/Sep/2025:00:00:10 -0600`
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Status code nginx uses when the client closed the connection before the response
pub const STATUS_CLIENT_CLOSED: u16 = 499;

/// Where a request entered the infrastructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Arrived through a CDN edge node
    Cdn,
    /// Client connected to the server directly
    Direct,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Cdn => "CDN",
            Origin::Direct => "DIRECT",
        }
    }

    pub fn is_cdn(&self) -> bool {
        matches!(self, Origin::Cdn)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hour-of-day a request was logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HourBucket {
    Hour(u8),
    Unknown,
}

impl HourBucket {
    /// Derive the bucket from a raw `day/mon/year:HH:MM:SS zone` timestamp.
    ///
    /// The hour is the second colon-delimited field. Anything that is not an
    /// hour of the day yields `Unknown`.
    pub fn from_timestamp(raw: &str) -> Self {
        raw.split(':')
            .nth(1)
            .and_then(|part| part.trim().parse::<u8>().ok())
            .filter(|hour| *hour < 24)
            .map(HourBucket::Hour)
            .unwrap_or(HourBucket::Unknown)
    }

    pub fn hour(&self) -> Option<u8> {
        match self {
            HourBucket::Hour(h) => Some(*h),
            HourBucket::Unknown => None,
        }
    }

    /// Two-digit label (`"07"`) or `"unknown"`
    pub fn label(&self) -> String {
        match self {
            HourBucket::Hour(h) => format!("{:02}", h),
            HourBucket::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for HourBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// A log timestamp: the text as it appeared in the line plus the instant it denotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub raw: String,
    pub instant: DateTime<FixedOffset>,
}

impl Timestamp {
    /// Parse a raw timestamp using [`TIMESTAMP_FORMAT`]
    pub fn parse(raw: &str) -> Option<Self> {
        DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .ok()
            .map(|instant| Timestamp {
                raw: raw.to_string(),
                instant,
            })
    }

    /// Human readable form, `2025-09-25 00:00:10`
    pub fn display(&self) -> String {
        self.instant.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn hour_bucket(&self) -> HourBucket {
        HourBucket::from_timestamp(&self.raw)
    }
}

/// `METHOD /path` with the query string removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointKey(String);

impl EndpointKey {
    pub fn new(method: &str, path: &str) -> Self {
        EndpointKey(format!("{} {}", method, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn method(&self) -> &str {
        self.0.split(' ').next().unwrap_or(&self.0)
    }

    pub fn path(&self) -> &str {
        self.0
            .split_once(' ')
            .map(|(_, path)| path)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One accepted access log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub status: u16,
    /// Seconds
    pub response_time: f64,
    pub timestamp: Option<Timestamp>,
    pub hour_bucket: HourBucket,
    pub origin: Origin,
}

impl RequestRecord {
    pub fn endpoint(&self) -> EndpointKey {
        EndpointKey::new(&self.method, &self.path)
    }

    pub fn is_slow(&self, threshold: f64) -> bool {
        self.response_time > threshold
    }

    pub fn is_client_closed(&self) -> bool {
        self.status == STATUS_CLIENT_CLOSED
    }

    pub fn is_cdn(&self) -> bool {
        self.origin.is_cdn()
    }
}
