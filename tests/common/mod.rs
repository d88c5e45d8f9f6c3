#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use arsip_api::access::Role;
use arsip_api::app::{app, AppState};
use arsip_api::config::{AppConfig, StorageBackend};
use arsip_api::database::models::{Document, DocumentType, Opd, User};
use arsip_api::database::{ArchiveStore, MemoryStore, NewDocument, NewOpd, NewUser};
use arsip_api::services::credentials::hash_password;

pub const PASSWORD: &str = "password123";

/// Router served on a free local port, backed by a fresh memory store.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.database.backend = StorageBackend::Memory;
        config.api.port = port;
        config.api.enable_request_logging = false;
        config.security.password_hash_cost = arsip_api::services::credentials::MIN_COST;

        let store = Arc::new(MemoryStore::new());
        let router = app(AppState::new(store.clone(), config));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { base_url, store, client: Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(body)
    }

    pub fn patch(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token).json(body)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, username: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login for {} failed: {}", username, res.status());
        let body = res.json::<Value>().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carries no token")
    }

    pub async fn opd(&self, name: &str, code: &str) -> Result<Opd> {
        Ok(self
            .store
            .insert_opd(NewOpd { name: name.to_string(), code: code.to_string(), description: None })
            .await?)
    }

    pub async fn user(&self, username: &str, role: Role, opd_id: Option<i64>) -> Result<User> {
        Ok(self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@bkpsdm.go.id", username),
                password_hash: hash_password(PASSWORD, arsip_api::services::credentials::MIN_COST)?,
                full_name: username.to_string(),
                role,
                opd_id,
            })
            .await?)
    }

    pub async fn document(&self, title: &str, opd_id: i64, uploaded_by: i64, is_public: bool) -> Result<Document> {
        Ok(self
            .store
            .insert_document(NewDocument {
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
            })
            .await?)
    }
}

/// Two units and one account per role; pengelola and staf belong to DISDIK.
pub struct World {
    pub server: TestServer,
    pub disdik: Opd,
    pub dinkes: Opd,
    pub admin: User,
    pub pengelola: User,
    pub staf: User,
}

impl World {
    pub async fn new() -> Result<Self> {
        let server = TestServer::spawn().await?;
        let disdik = server.opd("Dinas Pendidikan", "DISDIK").await?;
        let dinkes = server.opd("Dinas Kesehatan", "DINKES").await?;
        let admin = server.user("admin", Role::Admin, None).await?;
        let pengelola = server.user("pengelola", Role::Pengelola, Some(disdik.id)).await?;
        let staf = server.user("staf", Role::Staf, Some(disdik.id)).await?;
        Ok(Self { server, disdik, dinkes, admin, pengelola, staf })
    }
}

/// Ids of the documents in a `data` array, in response order.
pub fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .map(|items| items.iter().filter_map(|d| d["id"].as_i64()).collect())
        .unwrap_or_default()
}
