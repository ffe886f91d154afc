mod reader;

pub use reader::LogReader;
