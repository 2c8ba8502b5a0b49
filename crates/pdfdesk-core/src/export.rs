//! Text export in plain text, Markdown or HTML.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document;
use crate::error::PdfDeskError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::Text | ExportFormat::Markdown => "text/plain",
        }
    }

    /// Name of the exported file, e.g. `export.md`.
    pub fn filename(self) -> String {
        format!("export.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = PdfDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "txt" => Ok(ExportFormat::Text),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" => Ok(ExportFormat::Html),
            other => Err(PdfDeskError::validation(format!(
                "Unknown export format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
        })
    }
}

/// Text of every page, whitespace collapsed, in page order.
///
/// A page whose text cannot be decoded contributes an empty string.
pub fn page_texts(bytes: &[u8]) -> Result<Vec<String>, PdfDeskError> {
    let doc = document::load(bytes)?;
    let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();

    Ok(page_numbers
        .into_iter()
        .map(|page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
            Err(e) => {
                warn!(page = page_number, error = %e, "Could not extract page text");
                String::new()
            }
        })
        .collect())
}

pub fn export_text(bytes: &[u8], format: ExportFormat) -> Result<String, PdfDeskError> {
    let pages = page_texts(bytes)?;
    info!(pages = pages.len(), %format, "Exported text");
    Ok(render_pages(&pages, format))
}

/// Lay out already extracted page texts in the requested format.
pub fn render_pages(pages: &[String], format: ExportFormat) -> String {
    match format {
        ExportFormat::Text => pages.join("\n\n"),
        ExportFormat::Markdown => pages
            .iter()
            .enumerate()
            .map(|(idx, text)| format!("## Page {}\n\n{}", idx + 1, text))
            .collect::<Vec<_>>()
            .join("\n\n"),
        ExportFormat::Html => {
            let body = pages
                .iter()
                .enumerate()
                .map(|(idx, text)| format!("<h2>Page {}</h2><p>{}</p>", idx + 1, escape_html(text)))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "<!doctype html><html><head><meta charset=\"utf-8\"><title>PDF Export</title></head><body>{}</body></html>",
                body
            )
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
