use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::ArchiveStore;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware, validate_user_middleware};
use crate::services::{AuthService, DocumentService, OpdService, UserService};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArchiveStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ArchiveStore>, config: AppConfig) -> Self {
        Self { store, config: Arc::new(config) }
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.store.clone(), &self.config)
    }

    pub fn opds(&self) -> OpdService {
        OpdService::new(self.store.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone(), &self.config)
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.store.clone())
    }
}

pub fn app(state: AppState) -> Router {
    let authenticated = Router::new()
        .merge(auth_routes())
        .merge(document_routes())
        .merge(find_routes())
        .merge(opd_routes())
        .merge(admin_routes().route_layer(from_fn(require_admin_middleware)))
        // Layers run bottom-up: token first, then the user lookup
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(authenticated)
        .with_state(state.clone());

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.layer(cors_layer(&state.config))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::permissive().allow_origin(allowed)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(public::auth::login))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(protected::auth::whoami))
}

fn document_routes() -> Router<AppState> {
    use protected::documents;

    Router::new()
        .route("/api/documents", get(documents::list).post(documents::upload))
        .route("/api/documents/stats", get(documents::stats))
        .route(
            "/api/documents/:id",
            get(documents::show).patch(documents::update).delete(documents::delete),
        )
        .route("/api/documents/:id/download", get(documents::download))
}

fn find_routes() -> Router<AppState> {
    Router::new().route("/api/find/documents", post(protected::find::find_documents))
}

fn opd_routes() -> Router<AppState> {
    use protected::opds;

    Router::new()
        .route("/api/opds", get(opds::list))
        .route("/api/opds/:id", get(opds::show))
}

fn admin_routes() -> Router<AppState> {
    use elevated::admin;

    Router::new()
        .route("/api/admin/users", get(admin::user_list).post(admin::user_create))
        .route(
            "/api/admin/users/:id",
            get(admin::user_show).patch(admin::user_update).delete(admin::user_delete),
        )
        .route("/api/admin/opds", post(admin::opd_create))
        .route("/api/admin/opds/:id", patch(admin::opd_update).delete(admin::opd_delete))
        .route("/api/admin/opds/:id/can-delete", get(admin::opd_can_delete))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Arsip API",
            "version": version,
            "description": "Role-scoped document archive for organisational units",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "documents": "/api/documents[/:id[/download]], /api/documents/stats (protected)",
                "find": "/api/find/documents (protected)",
                "opds": "/api/opds[/:id] (protected)",
                "admin": "/api/admin/users[/:id], /api/admin/opds[/:id] (admin only)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    use crate::auth::{generate_jwt, Claims};
    use crate::testing::{test_config, Seeded};

    async fn router() -> (Router, Seeded) {
        let seeded = Seeded::new().await;
        let state = AppState::new(seeded.store.clone(), test_config());
        (app(state), seeded)
    }

    fn token_for(user: &crate::database::models::User) -> String {
        let secret = AppConfig::development().security.jwt_secret;
        generate_jwt(&Claims::for_user(user, 1), &secret).unwrap()
    }

    async fn send(router: Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let (router, _) = router().await;
        let (status, body) = send(router.clone(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Arsip API");

        let (status, body) = send(router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token() {
        let (router, _) = router().await;
        let (status, body) = send(router, Method::GET, "/api/documents", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_unauthorized() {
        let (router, seeded) = router().await;
        let mut ghost = seeded.staf.clone();
        ghost.id = 999;
        let (status, _) = send(router, Method::GET, "/api/auth/whoami", Some(&token_for(&ghost))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_gate_follows_role() {
        let (router, seeded) = router().await;
        let (status, _) = send(router.clone(), Method::GET, "/api/admin/users", Some(&token_for(&seeded.staf))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(router, Method::GET, "/api/admin/users", Some(&token_for(&seeded.admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn hidden_document_is_not_found() {
        let (router, seeded) = router().await;
        let hidden = seeded.document("Rahasia", seeded.dinkes.id, false).await;
        let uri = format!("/api/documents/{}", hidden.id);

        let (status, _) = send(router.clone(), Method::GET, &uri, Some(&token_for(&seeded.pengelola))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(router, Method::GET, &uri, Some(&token_for(&seeded.admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], hidden.id);
    }
}
