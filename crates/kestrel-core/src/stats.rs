use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Copy of `values` in ascending order
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Nearest-rank percentile over ascending `sorted` samples.
///
/// The `pct`-th percentile of N samples is the value at rank ⌈pct·N/100⌉
/// (1-based). The rank is computed in integers so boundary sizes like N = 20
/// or N = 100 land on exact ranks.
pub fn percentile(sorted: &[f64], pct: u32) -> Option<f64> {
    if sorted.is_empty() || pct == 0 || pct > 100 {
        return None;
    }
    let n = sorted.len();
    let rank = (pct as usize * n).div_ceil(100);
    sorted.get(rank.max(1) - 1).copied()
}

/// Summary of a set of response times. Every field is zero for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Distribution {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sorted = sorted(values);
        Distribution {
            count: sorted.len(),
            mean: mean(values).unwrap_or(0.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p95: percentile(&sorted, 95).unwrap_or(0.0),
            p99: percentile(&sorted, 99).unwrap_or(0.0),
        }
    }
}

/// `part` as a percentage of `whole`, zero when `whole` is zero
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
