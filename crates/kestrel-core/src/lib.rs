pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod export;
pub mod log;
pub mod origin;
pub mod parser;
pub mod record;
pub mod stats;
pub mod threshold;

pub use error::{Error, Result};
