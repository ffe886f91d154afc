mod line;

pub use line::{LineParser, ParseError, ParsedLine};
