use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::database::manager::DatabaseError;
use crate::database::models::{Document, DocumentType, Opd, User};
use crate::query::DocumentQuery;
use crate::types::double_option;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOpd {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update: `None` leaves a field untouched, `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpdChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub opd_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub opd_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub document_type: DocumentType,
    pub mime_type: String,
    pub opd_id: i64,
    pub uploaded_by: i64,
    pub created_date: Option<DateTime<Utc>>,
    pub tags: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub opd_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub created_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<String>>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Rows that still reference an organisational unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dependents {
    pub users: i64,
    pub documents: i64,
}

impl Dependents {
    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.documents == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpdDeletion {
    Deleted,
    Missing,
    /// Nothing was removed.
    Blocked(Dependents),
}

/// Persistence collaborator for users, organisational units and documents.
///
/// Implementations are plain CRUD; access decisions are made by the caller.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn list_opds(&self) -> Result<Vec<Opd>, DatabaseError>;
    async fn find_opd(&self, id: i64) -> Result<Option<Opd>, DatabaseError>;
    async fn find_opd_by_code(&self, code: &str) -> Result<Option<Opd>, DatabaseError>;
    async fn insert_opd(&self, opd: NewOpd) -> Result<Opd, DatabaseError>;
    async fn update_opd(&self, id: i64, changes: OpdChanges) -> Result<Option<Opd>, DatabaseError>;
    async fn opd_dependents(&self, id: i64) -> Result<Dependents, DatabaseError>;
    /// Check dependents and delete as one atomic step.
    async fn delete_opd_if_unreferenced(&self, id: i64) -> Result<OpdDeletion, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError>;

    async fn find_document(&self, id: i64) -> Result<Option<Document>, DatabaseError>;
    async fn insert_document(&self, document: NewDocument) -> Result<Document, DatabaseError>;
    async fn update_document(&self, id: i64, changes: DocumentChanges) -> Result<Option<Document>, DatabaseError>;
    async fn delete_document(&self, id: i64) -> Result<bool, DatabaseError>;
    /// Page of matching documents in query order, plus the total match count.
    async fn query_documents(&self, query: &DocumentQuery) -> Result<(Vec<Document>, i64), DatabaseError>;
}
