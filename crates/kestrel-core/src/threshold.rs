use crate::stats::{mean, percentile, sorted};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Slow cutoff used when there is nothing to derive one from
pub const DEFAULT_THRESHOLD: f64 = 1.0;
pub const MIN_SUGGESTED: f64 = 0.5;
pub const MAX_SUGGESTED: f64 = 3.0;

const P90_MARGIN: f64 = 1.5;
const MEAN_FACTOR: f64 = 2.0;
const MIN_PERCENTILE_SAMPLES: usize = 2;

/// What a suggested threshold was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum AdviceBasis {
    Percentiles { p75: f64, p90: f64 },
    Mean { mean: f64 },
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAdvice {
    pub suggested: f64,
    #[serde(flatten)]
    pub basis: AdviceBasis,
}

pub struct ThresholdAdvisor;

impl ThresholdAdvisor {
    /// Suggest a slow-request cutoff from observed response times.
    ///
    /// clamp(p90 × 1.5, 0.5, 3.0), or clamp(mean × 2, 0.5, 3.0) when there are
    /// too few samples for percentiles.
    pub fn advise(response_times: &[f64]) -> ThresholdAdvice {
        tracing::debug!(
            "Suggesting slow threshold from {} samples",
            response_times.len()
        );

        let advice = if response_times.len() >= MIN_PERCENTILE_SAMPLES {
            let ordered = sorted(response_times);
            let p75 = percentile(&ordered, 75).unwrap_or(0.0);
            let p90 = percentile(&ordered, 90).unwrap_or(0.0);
            ThresholdAdvice {
                suggested: Self::from_p90(p90),
                basis: AdviceBasis::Percentiles { p75, p90 },
            }
        } else if let Some(mean) = mean(response_times) {
            ThresholdAdvice {
                suggested: clamp(mean * MEAN_FACTOR),
                basis: AdviceBasis::Mean { mean },
            }
        } else {
            ThresholdAdvice {
                suggested: DEFAULT_THRESHOLD,
                basis: AdviceBasis::Default,
            }
        };

        tracing::info!("Suggested slow threshold: {:.2}s", advice.suggested);
        advice
    }

    pub fn from_p90(p90: f64) -> f64 {
        clamp(p90 * P90_MARGIN)
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(MIN_SUGGESTED, MAX_SUGGESTED)
}

/// The cutoff a run classifies slow requests with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedThreshold {
    pub seconds: f64,
    /// Present when the cutoff was suggested rather than supplied
    pub advice: Option<ThresholdAdvice>,
}

impl ResolvedThreshold {
    pub fn explicit(seconds: f64) -> Self {
        Self {
            seconds,
            advice: None,
        }
    }

    pub fn advised(advice: ThresholdAdvice) -> Self {
        Self {
            seconds: advice.suggested,
            advice: Some(advice),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.advice.is_none()
    }
}

/// Reject thresholds that cannot classify anything meaningfully
pub fn validate_threshold(seconds: f64) -> Result<f64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::InvalidThreshold(format!(
            "{} (must be a non-negative number of seconds)",
            seconds
        )));
    }
    Ok(seconds)
}
