pub mod auth_service;
pub mod credentials;
pub mod document_service;
pub mod error;
pub mod opd_guard;
pub mod opd_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use document_service::{CreateDocument, DocumentService, DocumentStats, DownloadInfo};
pub use error::ServiceError;
pub use opd_guard::{check_dependents, BlockReason};
pub use opd_service::OpdService;
pub use user_service::{CreateUser, UpdateUser, UserService};
