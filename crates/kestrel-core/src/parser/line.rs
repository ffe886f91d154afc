use crate::record::{HourBucket, Origin, RequestRecord, Timestamp};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref TIMESTAMP_PATTERN: Regex =
        Regex::new(r"(\d+/\w+/\d+:\d+:\d+:\d+ [+-]\d{4})").unwrap();
    static ref REQUEST_PATTERN: Regex = Regex::new(r#""(\w+) ([^\s"]+)"#).unwrap();
    static ref STATUS_PATTERN: Regex = Regex::new(r"\bstatus=(\d+)").unwrap();
    static ref ANY_STATUS_PATTERN: Regex = Regex::new(r"status=(\d+)").unwrap();
    static ref RESPONSE_TIME_PATTERN: Regex = Regex::new(r"\brt=(\d+(?:\.\d+)?)").unwrap();
    static ref ANY_RESPONSE_TIME_PATTERN: Regex = Regex::new(r"rt=(\d+(?:\.\d+)?)").unwrap();
}

/// Why a line was not turned into a request record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no quoted \"METHOD PATH\" request field")]
    MissingRequest,

    #[error("no status= field")]
    MissingStatus,

    #[error("status is not a valid HTTP status code: {0}")]
    InvalidStatus(String),
}

/// Fields extracted from one line, before origin classification
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine<'a> {
    /// First whitespace-delimited token, normally the peer address
    pub source: Option<&'a str>,
    pub method: String,
    /// Query string already stripped
    pub path: String,
    pub status: u16,
    pub response_time: f64,
    pub timestamp: Option<Timestamp>,
}

impl ParsedLine<'_> {
    pub fn hour_bucket(&self) -> HourBucket {
        self.timestamp
            .as_ref()
            .map(Timestamp::hour_bucket)
            .unwrap_or(HourBucket::Unknown)
    }

    pub fn into_record(self, origin: Origin) -> RequestRecord {
        let hour_bucket = self.hour_bucket();
        RequestRecord {
            method: self.method,
            path: self.path,
            status: self.status,
            response_time: self.response_time,
            timestamp: self.timestamp,
            hour_bucket,
            origin,
        }
    }
}

pub struct LineParser;

impl LineParser {
    /// Parse one access log line.
    ///
    /// Method, path and status are required. A missing or malformed timestamp
    /// leaves it unset and a missing `rt=` means a response time of zero.
    pub fn parse(line: &str) -> Result<ParsedLine<'_>, ParseError> {
        let (method, url) = REQUEST_PATTERN
            .captures(line)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .ok_or(ParseError::MissingRequest)?;

        let status_text = capture(line, &STATUS_PATTERN, &ANY_STATUS_PATTERN)
            .ok_or(ParseError::MissingStatus)?
            .to_string();
        let status = status_text
            .parse::<u16>()
            .ok()
            .filter(|code| (100..=999).contains(code))
            .ok_or(ParseError::InvalidStatus(status_text))?;

        let response_time = capture(line, &RESPONSE_TIME_PATTERN, &ANY_RESPONSE_TIME_PATTERN)
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(0.0);

        let timestamp = TIMESTAMP_PATTERN
            .captures(line)
            .and_then(|caps| Timestamp::parse(&caps[1]));

        let path = strip_query(&url).to_string();

        Ok(ParsedLine {
            source: Self::source(line),
            method,
            path,
            status,
            response_time,
            timestamp,
        })
    }

    /// First whitespace-delimited token of the line
    pub fn source(line: &str) -> Option<&str> {
        line.split_whitespace().next()
    }
}

/// Value of a standalone `key=` field, else of the first prefixed one such as
/// `upstream_key=`
fn capture<'a>(line: &'a str, standalone: &Regex, prefixed: &Regex) -> Option<&'a str> {
    standalone
        .captures(line)
        .or_else(|| prefixed.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
