use anyhow::{Context, Result};
use kestrel_core::export::{Cell, Dataset};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const MAX_SHEET_NAME: usize = 31;

/// Save one worksheet per non-empty dataset
pub fn write_workbook(datasets: &[Dataset], path: &Path) -> Result<()> {
    tracing::debug!("Writing workbook {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let mut sheets = 0;
    for dataset in datasets.iter().filter(|d| !d.is_empty()) {
        let sheet = workbook.add_worksheet();
        write_sheet(sheet, dataset, &header)
            .with_context(|| format!("Failed to write sheet {}", dataset.name))?;
        sheets += 1;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    tracing::info!("Wrote {} sheets to {}", sheets, path.display());
    Ok(())
}

fn write_sheet(sheet: &mut Worksheet, dataset: &Dataset, header: &Format) -> Result<(), XlsxError> {
    sheet.set_name(sheet_name(dataset.name))?;

    for (col, name) in dataset.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, header)?;
    }

    for (i, row) in dataset.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Int(v) => sheet.write_number(r, c, *v as f64)?,
                Cell::Float(v) => sheet.write_number(r, c, *v)?,
                Cell::Text(v) => sheet.write_string(r, c, v)?,
            };
        }
    }

    sheet.autofit();
    Ok(())
}

/// Title-cased sheet name, cut to Excel's 31 character limit
pub fn sheet_name(dataset: &str) -> String {
    let title: Vec<String> = dataset
        .split('_')
        .map(|word| match word {
            "http" | "cdn" => word.to_uppercase(),
            _ => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect();
    title.join(" ").chars().take(MAX_SHEET_NAME).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_names() {
        assert_eq!(sheet_name("processing_stats"), "Processing Stats");
        assert_eq!(sheet_name("cdn_vs_direct"), "CDN Vs Direct");
        assert_eq!(sheet_name("http_distribution"), "HTTP Distribution");
        assert_eq!(
            sheet_name("an_unusually_long_dataset_name_for_a_sheet").len(),
            MAX_SHEET_NAME
        );
    }
}
