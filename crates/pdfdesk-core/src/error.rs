use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfDeskError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    /// User-facing validation failure; the message is shown as-is.
    #[error("{0}")]
    Validation(String),

    #[error("No pages selected for {0}")]
    EmptySelection(&'static str),

    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange { index: u32, page_count: u32 },

    #[error("Unsupported image {name}: {reason}")]
    UnsupportedImage { name: String, reason: String },

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PdfDeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        PdfDeskError::Validation(message.into())
    }

    /// True for errors caused by user input rather than the document engine.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PdfDeskError::Validation(_) | PdfDeskError::EmptySelection(_)
        )
    }
}

impl From<lopdf::Error> for PdfDeskError {
    fn from(e: lopdf::Error) -> Self {
        PdfDeskError::Operation(e.to_string())
    }
}
