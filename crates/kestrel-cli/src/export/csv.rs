use anyhow::{Context, Result};
use kestrel_core::export::Dataset;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write one `<stem>_<dataset>.csv` per non-empty dataset into `dir`
pub fn write_datasets(datasets: &[Dataset], dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut written = Vec::new();
    for dataset in datasets.iter().filter(|d| !d.is_empty()) {
        let path = dir.join(format!("{}_{}.csv", stem, dataset.name));
        tracing::debug!("Writing {}", path.display());

        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        write_dataset(dataset, &mut out)?;
        out.flush()?;

        written.push(path);
    }

    tracing::info!("Wrote {} CSV files to {}", written.len(), dir.display());
    Ok(written)
}

pub fn write_dataset<W: Write>(dataset: &Dataset, out: &mut W) -> std::io::Result<()> {
    let header: Vec<Cow<'_, str>> = dataset.columns.iter().map(|c| escape(c)).collect();
    writeln!(out, "{}", header.join(","))?;

    for row in &dataset.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| escape(&cell.to_string()).into_owned())
            .collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

/// Quote a field when it holds a separator, quote or line break
pub fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("GET /a"), "GET /a");
        assert_eq!(escape("GET /a,b"), "\"GET /a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }
}
