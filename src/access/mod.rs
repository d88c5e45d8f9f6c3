//! Role model and the pure decision functions that gate reads and writes.
//!
//! Nothing here performs I/O. The HTTP boundary turns a `false` into a rejected request.

pub mod mutation;
pub mod role;
pub mod scope;
pub mod visibility;

pub use mutation::{can_mutate, can_upload, can_upload_to};
pub use role::{Requester, Role};
pub use scope::VisibilityScope;
pub use visibility::can_view;
