use crate::record::Origin;

/// Decides whether a log line reached the server through a CDN edge
///
/// Implementations must be cheap to call per line: anything expensive (like
/// fetching the CDN's published address ranges) belongs in their constructor.
pub trait OriginClassifier {
    /// `source` is the first whitespace-delimited token of the line, if any
    fn classify(&self, line: &str, source: Option<&str>) -> Origin;
}

impl<F> OriginClassifier for F
where
    F: Fn(&str, Option<&str>) -> Origin,
{
    fn classify(&self, line: &str, source: Option<&str>) -> Origin {
        self(line, source)
    }
}

/// Classifies every line as direct traffic
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectOnly;

impl OriginClassifier for DirectOnly {
    fn classify(&self, _line: &str, _source: Option<&str>) -> Origin {
        Origin::Direct
    }
}
