use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::info;

/// Extract the text layer of a PDF held in memory
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("PDF extraction task panicked")?
        .context("Failed to extract text from PDF")?;

    info!("Extracted {} chars of text from PDF ({} bytes)", text.len(), size);
    Ok(text)
}

/// Flatten every worksheet of a spreadsheet into `header: value` lines
pub async fn extract_excel_text(bytes: Vec<u8>) -> Result<String> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || workbook_to_text(bytes))
        .await
        .context("Excel extraction task panicked")??;

    info!("Extracted {} chars of text from spreadsheet ({} bytes)", text.len(), size);
    Ok(text)
}

fn workbook_to_text(bytes: Vec<u8>) -> Result<String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open spreadsheet")?;

    let mut text = String::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read worksheet '{}'", name))?;
        text.push_str(&worksheet_to_text(&name, &range));
    }

    Ok(text)
}

/// The first row is taken as the header row; later rows become
/// `Header: value | Header: value` lines with empty cells skipped.
pub fn worksheet_to_text(name: &str, range: &Range<Data>) -> String {
    let mut text = format!("Worksheet: {}\n\n", name);
    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .filter(|(_, cell)| !matches!(cell, Data::Empty))
            .map(|(col, cell)| {
                let header = headers
                    .get(col)
                    .filter(|h| !h.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("Column {}", col + 1));
                format!("{}: {}", header, cell)
            })
            .collect();

        if !cells.is_empty() {
            text.push_str(&cells.join(" | "));
            text.push('\n');
        }
    }

    text.push_str("\n\n");
    text
}
