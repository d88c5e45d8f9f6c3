use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, QueryBuilder as SqlBuilder, Row};
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Document, Opd, User};
use crate::database::repository::Repository;
use crate::database::store::{
    ArchiveStore, Dependents, DocumentChanges, NewDocument, NewOpd, NewUser, OpdChanges, OpdDeletion, UserChanges,
};
use crate::filter::FilterData;
use crate::query::DocumentQuery;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn opds(&self) -> Repository<Opd> {
        Repository::new("opds", self.pool.clone())
    }

    fn users(&self) -> Repository<User> {
        Repository::new("users", self.pool.clone()).with_cast("role", "user_role")
    }

    fn documents(&self) -> Repository<Document> {
        Repository::new("documents", self.pool.clone())
            .with_cast("upload_date", "timestamptz")
            .with_cast("document_type", "document_type")
    }
}

fn by_id() -> FilterData {
    FilterData { order: Some(Value::String("id asc".to_string())), ..Default::default() }
}

fn matching(column: &str, value: impl Into<Value>) -> FilterData {
    let value: Value = value.into();
    FilterData { where_clause: Some(json!({ column: value })), ..Default::default() }
}

/// Appends `, column = $n` for each present change, after a leading `updated_at = now()`.
struct Assignments<'a> {
    builder: SqlBuilder<'a, Postgres>,
}

impl<'a> Assignments<'a> {
    fn new(table: &str) -> Self {
        Self {
            builder: SqlBuilder::new(format!("UPDATE {} SET updated_at = now()", table)),
        }
    }

    fn set<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(format!(", {} = ", column));
            self.builder.push_bind(value);
        }
        self
    }

    fn finish(mut self, id: i64) -> SqlBuilder<'a, Postgres> {
        self.builder.push(" WHERE id = ");
        self.builder.push_bind(id);
        self.builder.push(" RETURNING *");
        self.builder
    }
}

#[async_trait]
impl ArchiveStore for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn list_opds(&self) -> Result<Vec<Opd>, DatabaseError> {
        self.opds().select_any(by_id()).await
    }

    async fn find_opd(&self, id: i64) -> Result<Option<Opd>, DatabaseError> {
        self.opds().select_id(id).await
    }

    async fn find_opd_by_code(&self, code: &str) -> Result<Option<Opd>, DatabaseError> {
        self.opds().select_one(matching("code", code)).await
    }

    async fn insert_opd(&self, opd: NewOpd) -> Result<Opd, DatabaseError> {
        sqlx::query_as::<_, Opd>("INSERT INTO opds (name, code, description) VALUES ($1, $2, $3) RETURNING *")
            .bind(opd.name)
            .bind(opd.code)
            .bind(opd.description)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn update_opd(&self, id: i64, changes: OpdChanges) -> Result<Option<Opd>, DatabaseError> {
        let mut assignments = Assignments::new("opds");
        assignments
            .set("name", changes.name)
            .set("code", changes.code)
            .set("description", changes.description);
        let mut builder = assignments.finish(id);
        builder
            .build_query_as::<Opd>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn opd_dependents(&self, id: i64) -> Result<Dependents, DatabaseError> {
        Ok(Dependents {
            users: self.users().count(matching("opd_id", id)).await?,
            documents: self.documents().count(matching("opd_id", id)).await?,
        })
    }

    async fn delete_opd_if_unreferenced(&self, id: i64) -> Result<OpdDeletion, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises against concurrent inserts that reference this unit.
        let locked = sqlx::query("SELECT id FROM opds WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(OpdDeletion::Missing);
        }

        let users: i64 = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE opd_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("count")?;
        let documents: i64 = sqlx::query("SELECT COUNT(*) AS count FROM documents WHERE opd_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("count")?;
        let dependents = Dependents { users, documents };
        if !dependents.is_empty() {
            debug!("Unit {} still referenced: {:?}", id, dependents);
            return Ok(OpdDeletion::Blocked(dependents));
        }

        sqlx::query("DELETE FROM opds WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(OpdDeletion::Deleted)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        self.users().select_any(by_id()).await
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.users().select_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.users().select_one(matching("username", username)).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.users().select_one(matching("email", email)).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, full_name, role, opd_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.role)
        .bind(user.opd_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut assignments = Assignments::new("users");
        assignments
            .set("username", changes.username)
            .set("email", changes.email)
            .set("password_hash", changes.password_hash)
            .set("full_name", changes.full_name)
            .set("role", changes.role)
            .set("opd_id", changes.opd_id)
            .set("is_active", changes.is_active);
        let mut builder = assignments.finish(id);
        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn find_document(&self, id: i64) -> Result<Option<Document>, DatabaseError> {
        self.documents().select_id(id).await
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document, DatabaseError> {
        sqlx::query_as::<_, Document>(
            "INSERT INTO documents \
             (title, description, file_path, file_name, file_size, document_type, mime_type, \
              opd_id, uploaded_by, created_date, tags, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(document.title)
        .bind(document.description)
        .bind(document.file_path)
        .bind(document.file_name)
        .bind(document.file_size)
        .bind(document.document_type)
        .bind(document.mime_type)
        .bind(document.opd_id)
        .bind(document.uploaded_by)
        .bind(document.created_date)
        .bind(document.tags)
        .bind(document.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)
    }

    async fn update_document(&self, id: i64, changes: DocumentChanges) -> Result<Option<Document>, DatabaseError> {
        let mut assignments = Assignments::new("documents");
        assignments
            .set("title", changes.title)
            .set("description", changes.description)
            .set("opd_id", changes.opd_id)
            .set("created_date", changes.created_date)
            .set("tags", changes.tags)
            .set("is_public", changes.is_public);
        let mut builder = assignments.finish(id);
        builder
            .build_query_as::<Document>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn delete_document(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query_documents(&self, query: &DocumentQuery) -> Result<(Vec<Document>, i64), DatabaseError> {
        self.documents().select_page(query.to_filter_data()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_filters() {
        let data = matching("code", "DISDIK");
        assert_eq!(data.where_clause, Some(json!({ "code": "DISDIK" })));
        assert_eq!(data.order, None);

        assert_eq!(matching("opd_id", 7i64).where_clause, Some(json!({ "opd_id": 7 })));
        assert_eq!(by_id().order, Some(json!("id asc")));
        assert_eq!(by_id().where_clause, None);
    }
}
