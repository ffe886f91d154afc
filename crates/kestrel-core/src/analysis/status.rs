use super::{Analyzer, StatusRow};
use crate::Result;
use crate::aggregate::Aggregates;
use crate::stats::{mean, percentage};
use std::collections::BTreeMap;

pub struct StatusAnalyzer;

impl Analyzer for StatusAnalyzer {
    type Output = Vec<StatusRow>;

    fn analyze(&self, aggregates: &Aggregates) -> Result<Self::Output> {
        tracing::debug!("Analyzing HTTP status distribution");

        // status -> (cdn, direct, response times)
        let mut per_status: BTreeMap<u16, (usize, usize, Vec<f64>)> = BTreeMap::new();
        for record in aggregates.records() {
            let entry = per_status.entry(record.status).or_default();
            if record.is_cdn() {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
            entry.2.push(record.response_time);
        }

        let grand_total: usize = aggregates.statuses().values().map(|b| b.count).sum();

        let rows = aggregates
            .statuses()
            .iter()
            .map(|(&status, bucket)| {
                let (cdn, direct, times) = per_status.remove(&status).unwrap_or_default();
                StatusRow {
                    status,
                    description: status_description(status).map(str::to_string),
                    total: bucket.count,
                    percentage: percentage(bucket.count, grand_total),
                    cdn,
                    direct,
                    mean_time: mean(&times).unwrap_or(0.0),
                }
            })
            .collect();

        Ok(rows)
    }
}

/// Short reason phrase for the status codes access logs commonly show
pub fn status_description(status: u16) -> Option<&'static str> {
    let description = match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        499 => "Client Closed Request",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(description)
}
