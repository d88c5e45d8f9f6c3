use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::access::Requester;
use crate::config::AppConfig;
use crate::database::models::{Document, DocumentType};
use crate::database::{ArchiveStore, DocumentChanges, NewDocument};
use crate::query::{DocumentQuery, DocumentSearch, Paged};
use crate::services::error::ServiceError;
use crate::services::opd_service::required;

/// Metadata for a file that was already written to storage.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    /// Derived from `file_name` when absent.
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    pub opd_id: i64,
    pub uploaded_by: i64,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadInfo {
    pub file_path: String,
    pub file_name: String,
    pub mime_type: String,
}

impl From<&Document> for DownloadInfo {
    fn from(document: &Document) -> Self {
        Self {
            file_path: document.file_path.clone(),
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub total: i64,
    pub public: i64,
    pub by_type: BTreeMap<DocumentType, i64>,
}

/// Document listing, search and lifecycle.
///
/// Access predicates are not applied here beyond the visibility scope of listings; the caller
/// decides whether a requester may view, change or upload a given document.
pub struct DocumentService {
    store: Arc<dyn ArchiveStore>,
    default_page_size: i64,
    max_page_size: i64,
    max_upload_bytes: i64,
}

impl DocumentService {
    pub fn new(store: Arc<dyn ArchiveStore>, config: &AppConfig) -> Self {
        Self {
            store,
            default_page_size: config.query.default_page_size,
            max_page_size: config.query.max_page_size,
            max_upload_bytes: config.api.max_upload_bytes,
        }
    }

    async fn requester(&self, requester_id: i64) -> Result<Requester, ServiceError> {
        let user = self
            .store
            .find_user(requester_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", requester_id))?;
        Ok(Requester::from(&user))
    }

    /// Every document in the requester's scope, newest first.
    pub async fn list_documents(&self, requester_id: i64, include_private: bool) -> Result<Vec<Document>, ServiceError> {
        let requester = self.requester(requester_id).await?;
        let query = DocumentQuery::listing(&requester, include_private);
        let (items, _) = self.store.query_documents(&query).await?;
        Ok(items)
    }

    pub async fn search_documents(&self, requester_id: i64, search: &DocumentSearch) -> Result<Paged<Document>, ServiceError> {
        let requester = self.requester(requester_id).await?;
        let query = DocumentQuery::search(&requester, search, self.default_page_size, self.max_page_size)?;
        let (items, total) = self.store.query_documents(&query).await?;
        let (page, limit) = query.page.map_or((1, total), |p| (p.page, p.limit));
        Ok(Paged { items, total, page, limit })
    }

    pub async fn get_document(&self, id: i64) -> Result<Document, ServiceError> {
        self.store
            .find_document(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("document", id))
    }

    pub async fn create_document(&self, input: CreateDocument) -> Result<Document, ServiceError> {
        let title = required("title", &input.title)?;
        let file_path = required("file_path", &input.file_path)?;
        let file_name = required("file_name", &input.file_name)?;
        let mime_type = input.mime_type.trim().to_ascii_lowercase();
        if DocumentType::from_mime(&mime_type).is_none() {
            return Err(ServiceError::invalid(format!("file type {} is not allowed", input.mime_type)));
        }
        if input.file_size < 1 || input.file_size > self.max_upload_bytes {
            return Err(ServiceError::invalid(format!(
                "file size must be between 1 and {} bytes",
                self.max_upload_bytes
            )));
        }
        let document_type = input.document_type.unwrap_or_else(|| DocumentType::from_file_name(&file_name));

        if self.store.find_opd(input.opd_id).await?.is_none() {
            return Err(ServiceError::not_found("opd", input.opd_id));
        }
        if self.store.find_user(input.uploaded_by).await?.is_none() {
            return Err(ServiceError::not_found("user", input.uploaded_by));
        }

        let document = self
            .store
            .insert_document(NewDocument {
                title,
                description: input.description,
                file_path,
                file_name,
                file_size: input.file_size,
                document_type,
                mime_type,
                opd_id: input.opd_id,
                uploaded_by: input.uploaded_by,
                created_date: input.created_date,
                tags: input.tags,
                is_public: input.is_public,
            })
            .await?;
        info!("Stored document {} in unit {}", document.id, document.opd_id);
        Ok(document)
    }

    pub async fn update_document(&self, id: i64, mut changes: DocumentChanges) -> Result<Document, ServiceError> {
        self.get_document(id).await?;
        if let Some(title) = &changes.title {
            changes.title = Some(required("title", title)?);
        }
        if let Some(opd_id) = changes.opd_id {
            if self.store.find_opd(opd_id).await?.is_none() {
                return Err(ServiceError::not_found("opd", opd_id));
            }
        }
        self.store
            .update_document(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("document", id))
    }

    pub async fn delete_document(&self, id: i64) -> Result<bool, ServiceError> {
        if !self.store.delete_document(id).await? {
            return Err(ServiceError::not_found("document", id));
        }
        info!("Deleted document {}", id);
        Ok(true)
    }

    /// Counts over everything the requester may read, private documents included.
    pub async fn stats(&self, requester_id: i64) -> Result<DocumentStats, ServiceError> {
        let requester = self.requester(requester_id).await?;
        let query = DocumentQuery::listing(&requester, true);
        let (documents, total) = self.store.query_documents(&query).await?;

        let mut by_type: BTreeMap<DocumentType, i64> = DocumentType::ALL.iter().map(|t| (*t, 0)).collect();
        for document in &documents {
            *by_type.entry(document.document_type).or_default() += 1;
        }
        Ok(DocumentStats {
            total,
            public: documents.iter().filter(|d| d.is_public).count() as i64,
            by_type,
        })
    }
}
