use crate::aggregate::{Aggregates, Aggregator};
use crate::origin::OriginClassifier;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const PROGRESS_INTERVAL: usize = 10_000;

pub struct LogReader;

impl LogReader {
    /// Read an access log from disk and aggregate it.
    ///
    /// `threshold` fixes the slow cutoff up front; `None` lets it be suggested
    /// from the observed response times.
    pub fn from_file(
        path: &Path,
        classifier: &dyn OriginClassifier,
        threshold: Option<f64>,
    ) -> Result<Aggregates> {
        tracing::debug!("Reading access log from: {}", path.display());

        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), classifier, threshold)
    }

    /// Aggregate every line of an already opened log
    pub fn from_reader<R: BufRead>(
        reader: R,
        classifier: &dyn OriginClassifier,
        threshold: Option<f64>,
    ) -> Result<Aggregates> {
        let mut aggregator = match threshold {
            Some(seconds) => Aggregator::with_threshold(seconds),
            None => Aggregator::new(),
        };
        Self::read(reader, classifier, &mut aggregator)?;

        Ok(aggregator.finish())
    }

    /// Feed every line of `reader` into `aggregator`.
    ///
    /// Bytes that are not UTF-8 are replaced rather than failing the line.
    pub fn read<R: BufRead>(
        mut reader: R,
        classifier: &dyn OriginClassifier,
        aggregator: &mut Aggregator,
    ) -> Result<()> {
        let mut buf = Vec::new();
        let mut lines = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lines += 1;

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            // Failures are already counted by the aggregator
            let _ = aggregator.ingest_line(line, classifier);

            if lines.is_multiple_of(PROGRESS_INTERVAL) {
                tracing::debug!("Processed {} lines", lines);
            }
        }

        let summary = aggregator.summary();
        tracing::info!(
            "Read {} lines: {} parsed, {} skipped",
            lines,
            summary.parsed_lines,
            summary.skipped_lines()
        );

        Ok(())
    }
}
