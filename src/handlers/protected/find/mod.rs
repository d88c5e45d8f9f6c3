pub mod find_post;

pub use find_post::find_documents;
