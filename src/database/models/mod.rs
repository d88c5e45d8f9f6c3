pub mod document;
pub mod opd;
pub mod user;

pub use document::{Document, DocumentType};
pub use opd::Opd;
pub use user::User;
