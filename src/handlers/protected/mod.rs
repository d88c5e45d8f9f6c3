pub mod auth;
pub mod documents;
pub mod find;
pub mod opds;
