use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coarse classification of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Image,
    Word,
    Excel,
}

/// MIME types accepted for upload, with the classification each maps to.
pub const ALLOWED_MIME_TYPES: &[(&str, DocumentType)] = &[
    ("application/pdf", DocumentType::Pdf),
    ("image/jpeg", DocumentType::Image),
    ("image/jpg", DocumentType::Image),
    ("image/png", DocumentType::Image),
    ("image/gif", DocumentType::Image),
    ("image/bmp", DocumentType::Image),
    ("application/msword", DocumentType::Word),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", DocumentType::Word),
    ("application/vnd.ms-excel", DocumentType::Excel),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", DocumentType::Excel),
];

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [DocumentType::Pdf, DocumentType::Image, DocumentType::Word, DocumentType::Excel];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Image => "image",
            DocumentType::Word => "word",
            DocumentType::Excel => "excel",
        }
    }

    /// Classify by file extension; unknown extensions fall back to pdf.
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" => DocumentType::Image,
            "doc" | "docx" => DocumentType::Word,
            "xls" | "xlsx" => DocumentType::Excel,
            _ => DocumentType::Pdf,
        }
    }

    /// Classification for an accepted MIME type, `None` when the type is not allowed.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        ALLOWED_MIME_TYPES
            .iter()
            .find(|(allowed, _)| *allowed == mime_type)
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub document_type: DocumentType,
    pub mime_type: String,
    pub opd_id: i64,
    pub uploaded_by: i64,
    /// System-assigned at insert.
    pub upload_date: DateTime<Utc>,
    /// Business metadata supplied by the uploader, unrelated to `upload_date`.
    pub created_date: Option<DateTime<Utc>>,
    /// Comma-separated.
    pub tags: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
