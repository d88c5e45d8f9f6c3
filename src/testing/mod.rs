//! Fixtures shared by the unit tests.

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use crate::access::Role;
use crate::config::AppConfig;
use crate::database::models::{Document, DocumentType, Opd, User};
use crate::database::{ArchiveStore, MemoryStore, NewDocument, NewOpd, NewUser};

/// Development configuration with the cheapest password hashing.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.password_hash_cost = crate::services::credentials::MIN_COST;
    config
}

/// Detached document row; never stored.
pub fn document_fixture(id: i64, opd_id: i64, is_public: bool) -> Document {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + chrono::Duration::minutes(id);
    Document {
        id,
        title: format!("Dokumen {}", id),
        description: None,
        file_path: format!("uploads/{}.pdf", id),
        file_name: format!("{}.pdf", id),
        file_size: 1024,
        document_type: DocumentType::Pdf,
        mime_type: "application/pdf".to_string(),
        opd_id,
        uploaded_by: 1,
        upload_date: at,
        created_date: None,
        tags: None,
        is_public,
        created_at: at,
        updated_at: at,
    }
}

/// Memory store with two units (DISDIK, DINKES) and one user per role.
///
/// The pengelola and staf both belong to DISDIK.
pub struct Seeded {
    pub store: Arc<MemoryStore>,
    pub disdik: Opd,
    pub dinkes: Opd,
    pub admin: User,
    pub pengelola: User,
    pub staf: User,
}

impl Seeded {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let disdik = store
            .insert_opd(NewOpd { name: "Dinas Pendidikan".to_string(), code: "DISDIK".to_string(), description: None })
            .await
            .unwrap();
        let dinkes = store
            .insert_opd(NewOpd { name: "Dinas Kesehatan".to_string(), code: "DINKES".to_string(), description: None })
            .await
            .unwrap();
        let admin = store.insert_user(new_user("admin", Role::Admin, None)).await.unwrap();
        let pengelola = store.insert_user(new_user("pengelola", Role::Pengelola, Some(disdik.id))).await.unwrap();
        let staf = store.insert_user(new_user("staf", Role::Staf, Some(disdik.id))).await.unwrap();
        Self { store, disdik, dinkes, admin, pengelola, staf }
    }

    pub async fn document(&self, title: &str, opd_id: i64, is_public: bool) -> Document {
        self.store
            .insert_document(new_document(title, opd_id, self.admin.id, is_public))
            .await
            .unwrap()
    }
}

pub fn new_user(username: &str, role: Role, opd_id: Option<i64>) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@bkpsdm.go.id", username),
        password_hash: crate::services::credentials::hash_password("password123", crate::services::credentials::MIN_COST).unwrap(),
        full_name: username.to_string(),
        role,
        opd_id,
    }
}

pub fn new_document(title: &str, opd_id: i64, uploaded_by: i64, is_public: bool) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        description: None,
        file_path: format!("uploads/{}.pdf", title.to_lowercase().replace(' ', "-")),
        file_name: format!("{}.pdf", title),
        file_size: 2048,
        document_type: DocumentType::Pdf,
        mime_type: "application/pdf".to_string(),
        opd_id,
        uploaded_by,
        created_date: None,
        tags: None,
        is_public,
    }
}
