use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Document, Opd, User};
use crate::database::store::{
    ArchiveStore, Dependents, DocumentChanges, NewDocument, NewOpd, NewUser, OpdChanges, OpdDeletion, UserChanges,
};
use crate::query::DocumentQuery;

/// Keyed by id, so iteration order is id order.
#[derive(Default)]
struct Tables {
    opds: BTreeMap<i64, Opd>,
    users: BTreeMap<i64, User>,
    documents: BTreeMap<i64, Document>,
    next_opd_id: i64,
    next_user_id: i64,
    next_document_id: i64,
}

impl Tables {
    fn dependents(&self, opd_id: i64) -> Dependents {
        Dependents {
            users: self.users.values().filter(|u| u.opd_id == Some(opd_id)).count() as i64,
            documents: self.documents.values().filter(|d| d.opd_id == opd_id).count() as i64,
        }
    }

    fn check_opd_code(&self, code: &str, except: Option<i64>) -> Result<(), DatabaseError> {
        if self.opds.values().any(|o| o.code == code && Some(o.id) != except) {
            return Err(DatabaseError::Conflict("opds_code_key".to_string()));
        }
        Ok(())
    }

    fn check_user_unique(&self, username: Option<&str>, email: Option<&str>, except: Option<i64>) -> Result<(), DatabaseError> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if username == Some(user.username.as_str()) {
                return Err(DatabaseError::Conflict("users_username_key".to_string()));
            }
            if email == Some(user.email.as_str()) {
                return Err(DatabaseError::Conflict("users_email_key".to_string()));
            }
        }
        Ok(())
    }

    fn check_opd_exists(&self, opd_id: Option<i64>) -> Result<(), DatabaseError> {
        match opd_id {
            Some(id) if !self.opds.contains_key(&id) => Err(DatabaseError::NotFound(format!("opd {}", id))),
            _ => Ok(()),
        }
    }
}

/// In-process store with the same constraint behaviour as the PostgreSQL schema.
///
/// Every write holds the single table lock, so check-then-act sequences are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_opds(&self) -> Result<Vec<Opd>, DatabaseError> {
        Ok(self.tables.read().await.opds.values().cloned().collect())
    }

    async fn find_opd(&self, id: i64) -> Result<Option<Opd>, DatabaseError> {
        Ok(self.tables.read().await.opds.get(&id).cloned())
    }

    async fn find_opd_by_code(&self, code: &str) -> Result<Option<Opd>, DatabaseError> {
        Ok(self.tables.read().await.opds.values().find(|o| o.code == code).cloned())
    }

    async fn insert_opd(&self, opd: NewOpd) -> Result<Opd, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_opd_code(&opd.code, None)?;
        tables.next_opd_id += 1;
        let now = Utc::now();
        let row = Opd {
            id: tables.next_opd_id,
            name: opd.name,
            code: opd.code,
            description: opd.description,
            created_at: now,
            updated_at: now,
        };
        tables.opds.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_opd(&self, id: i64, changes: OpdChanges) -> Result<Option<Opd>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(code) = &changes.code {
            tables.check_opd_code(code, Some(id))?;
        }
        let Some(opd) = tables.opds.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            opd.name = name;
        }
        if let Some(code) = changes.code {
            opd.code = code;
        }
        if let Some(description) = changes.description {
            opd.description = description;
        }
        opd.updated_at = Utc::now();
        Ok(Some(opd.clone()))
    }

    async fn opd_dependents(&self, id: i64) -> Result<Dependents, DatabaseError> {
        Ok(self.tables.read().await.dependents(id))
    }

    async fn delete_opd_if_unreferenced(&self, id: i64) -> Result<OpdDeletion, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.opds.contains_key(&id) {
            return Ok(OpdDeletion::Missing);
        }
        let dependents = tables.dependents(id);
        if !dependents.is_empty() {
            return Ok(OpdDeletion::Blocked(dependents));
        }
        tables.opds.remove(&id);
        Ok(OpdDeletion::Deleted)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_user_unique(Some(&user.username), Some(&user.email), None)?;
        tables.check_opd_exists(user.opd_id)?;
        tables.next_user_id += 1;
        let now = Utc::now();
        let row = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            opd_id: user.opd_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_user_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))?;
        if let Some(opd_id) = changes.opd_id {
            tables.check_opd_exists(opd_id)?;
        }
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(opd_id) = changes.opd_id {
            user.opd_id = opd_id;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn find_document(&self, id: i64) -> Result<Option<Document>, DatabaseError> {
        Ok(self.tables.read().await.documents.get(&id).cloned())
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_opd_exists(Some(document.opd_id))?;
        if !tables.users.contains_key(&document.uploaded_by) {
            return Err(DatabaseError::NotFound(format!("user {}", document.uploaded_by)));
        }
        tables.next_document_id += 1;
        let now = Utc::now();
        let row = Document {
            id: tables.next_document_id,
            title: document.title,
            description: document.description,
            file_path: document.file_path,
            file_name: document.file_name,
            file_size: document.file_size,
            document_type: document.document_type,
            mime_type: document.mime_type,
            opd_id: document.opd_id,
            uploaded_by: document.uploaded_by,
            upload_date: now,
            created_date: document.created_date,
            tags: document.tags,
            is_public: document.is_public,
            created_at: now,
            updated_at: now,
        };
        tables.documents.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_document(&self, id: i64, changes: DocumentChanges) -> Result<Option<Document>, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_opd_exists(changes.opd_id)?;
        let Some(document) = tables.documents.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            document.title = title;
        }
        if let Some(description) = changes.description {
            document.description = description;
        }
        if let Some(opd_id) = changes.opd_id {
            document.opd_id = opd_id;
        }
        if let Some(created_date) = changes.created_date {
            document.created_date = created_date;
        }
        if let Some(tags) = changes.tags {
            document.tags = tags;
        }
        if let Some(is_public) = changes.is_public {
            document.is_public = is_public;
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.documents.remove(&id).is_some())
    }

    async fn query_documents(&self, query: &DocumentQuery) -> Result<(Vec<Document>, i64), DatabaseError> {
        let tables = self.tables.read().await;
        let matching: Vec<Document> = tables.documents.values().filter(|d| query.matches(d)).cloned().collect();
        Ok(query.paginate(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::database::models::DocumentType;

    fn unit(code: &str) -> NewOpd {
        NewOpd { name: format!("Dinas {}", code), code: code.to_string(), description: None }
    }

    fn staff(username: &str, opd_id: Option<i64>) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.go.id", username),
            password_hash: "x".to_string(),
            full_name: username.to_uppercase(),
            role: Role::Staf,
            opd_id,
        }
    }

    fn upload(opd_id: i64, uploaded_by: i64) -> NewDocument {
        NewDocument {
            title: "Surat".to_string(),
            description: None,
            file_path: "uploads/surat.pdf".to_string(),
            file_name: "surat.pdf".to_string(),
            file_size: 10,
            document_type: DocumentType::Pdf,
            mime_type: "application/pdf".to_string(),
            opd_id,
            uploaded_by,
            created_date: None,
            tags: None,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn unit_codes_are_unique() {
        let store = MemoryStore::new();
        let first = store.insert_opd(unit("DISDIK")).await.unwrap();
        let second = store.insert_opd(unit("DINKES")).await.unwrap();
        assert!(matches!(store.insert_opd(unit("DISDIK")).await, Err(DatabaseError::Conflict(_))));

        let rename = OpdChanges { code: Some("DISDIK".to_string()), ..Default::default() };
        assert!(matches!(store.update_opd(second.id, rename).await, Err(DatabaseError::Conflict(_))));

        // Keeping its own code is not a conflict
        let same = OpdChanges { code: Some("DISDIK".to_string()), ..Default::default() };
        assert!(store.update_opd(first.id, same).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn guarded_delete_reports_dependents() {
        let store = MemoryStore::new();
        let opd = store.insert_opd(unit("BKD")).await.unwrap();
        let user = store.insert_user(staff("budi", Some(opd.id))).await.unwrap();
        let doc = store.insert_document(upload(opd.id, user.id)).await.unwrap();

        assert_eq!(
            store.delete_opd_if_unreferenced(opd.id).await.unwrap(),
            OpdDeletion::Blocked(Dependents { users: 1, documents: 1 })
        );

        store.delete_document(doc.id).await.unwrap();
        store.update_user(user.id, UserChanges { opd_id: Some(None), ..Default::default() }).await.unwrap();
        assert_eq!(store.delete_opd_if_unreferenced(opd.id).await.unwrap(), OpdDeletion::Deleted);
        assert_eq!(store.delete_opd_if_unreferenced(opd.id).await.unwrap(), OpdDeletion::Missing);
    }

    #[tokio::test]
    async fn references_must_exist() {
        let store = MemoryStore::new();
        assert!(matches!(store.insert_user(staff("ani", Some(42))).await, Err(DatabaseError::NotFound(_))));
        let opd = store.insert_opd(unit("BKD")).await.unwrap();
        assert!(matches!(store.insert_document(upload(opd.id, 7)).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn partial_update_only_touches_supplied_fields() {
        let store = MemoryStore::new();
        let opd = store.insert_opd(unit("BKD")).await.unwrap();
        let user = store.insert_user(staff("citra", Some(opd.id))).await.unwrap();
        let mut new_doc = upload(opd.id, user.id);
        new_doc.tags = Some("arsip".to_string());
        new_doc.description = Some("lama".to_string());
        let doc = store.insert_document(new_doc).await.unwrap();

        let changes = DocumentChanges { tags: Some(None), is_public: Some(true), ..Default::default() };
        let updated = store.update_document(doc.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.tags, None);
        assert!(updated.is_public);
        assert_eq!(updated.description.as_deref(), Some("lama"));
        assert_eq!(updated.title, doc.title);
        assert_eq!(updated.upload_date, doc.upload_date);
    }
}
