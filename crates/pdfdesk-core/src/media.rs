//! Input file kinds
//!
//! Browsers hand over a MIME type with each file; elsewhere the kind is
//! sniffed from magic bytes, falling back to the file extension.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Other,
}

impl FileKind {
    pub fn sniff(name: &str, bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF-") {
            return FileKind::Pdf;
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return FileKind::Png;
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return FileKind::Jpeg;
        }
        Self::from_extension(name)
    }

    pub fn from_extension(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => FileKind::Pdf,
            "png" => FileKind::Png,
            "jpg" | "jpeg" => FileKind::Jpeg,
            _ => FileKind::Other,
        }
    }

    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "application/pdf" => FileKind::Pdf,
            "image/png" => FileKind::Png,
            "image/jpeg" | "image/jpg" => FileKind::Jpeg,
            _ => FileKind::Other,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Other => "application/octet-stream",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Png => "png",
            FileKind::Jpeg => "jpg",
            FileKind::Other => "bin",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, FileKind::Png | FileKind::Jpeg)
    }
}
