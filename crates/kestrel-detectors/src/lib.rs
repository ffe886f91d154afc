pub mod error;
pub mod origin;

pub use error::{Error, Result};
pub use origin::{CdnClassifier, CdnRanges, RangeFetcher, RangeSource};
