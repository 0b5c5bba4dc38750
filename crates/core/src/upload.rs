//! Uploaded file payloads.

use std::path::Path;

use crate::error::{Error, Result};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_CSV: &str = "text/csv";

/// The file kinds the upload interface accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    PlainText,
    Pdf,
    Csv,
}

impl UploadKind {
    /// Map a file extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Map a media type to a kind.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            MIME_TEXT => Some(Self::PlainText),
            MIME_PDF => Some(Self::Pdf),
            MIME_CSV => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::PlainText => MIME_TEXT,
            Self::Pdf => MIME_PDF,
            Self::Csv => MIME_CSV,
        }
    }
}

/// A typed file payload handed over by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Accept a file from disk, rejecting anything but `.txt`, `.pdf`, `.csv`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(UploadKind::from_extension)
            .ok_or_else(|| Error::UnsupportedFileType(name.clone()))?;

        let bytes = std::fs::read(path)?;
        Ok(Self::new(name, kind.media_type(), bytes))
    }

    /// The kind implied by the media type, if supported.
    pub fn kind(&self) -> Option<UploadKind> {
        UploadKind::from_media_type(&self.media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(UploadKind::from_extension("PDF"), Some(UploadKind::Pdf));
        assert_eq!(UploadKind::from_extension("csv"), Some(UploadKind::Csv));
        assert_eq!(UploadKind::from_extension("docx"), None);
    }

    #[test]
    fn unsupported_path_rejected_before_reading() {
        let err = Upload::from_path(Path::new("/nonexistent/report.docx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(name) if name == "report.docx"));
    }

    #[test]
    fn missing_supported_file_is_io_error() {
        let err = Upload::from_path(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn kind_from_media_type() {
        let up = Upload::new("a.csv", MIME_CSV, vec![]);
        assert_eq!(up.kind(), Some(UploadKind::Csv));
        let odd = Upload::new("a.bin", "application/octet-stream", vec![]);
        assert_eq!(odd.kind(), None);
    }
}
