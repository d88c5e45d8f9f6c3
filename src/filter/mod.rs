//! JSON filter DSL rendered to parameterised PostgreSQL.
//!
//! ```json
//! { "where": { "is_public": true, "title": { "$ilike": "%laporan%" } },
//!   "order": "upload_date desc, id desc",
//!   "limit": 20, "offset": 40 }
//! ```

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::*;
