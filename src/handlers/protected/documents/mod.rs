pub mod list;
pub mod record;
pub mod stats;
pub mod upload;

pub use list::list;
pub use record::{delete, download, show, update};
pub use stats::stats;
pub use upload::upload;

use crate::access::{can_view, Requester};
use crate::app::AppState;
use crate::database::models::Document;
use crate::error::ApiError;

/// Fetch a document the requester may read.
///
/// A document outside the requester's scope answers exactly like a missing one.
pub(crate) async fn visible_document(state: &AppState, requester: &Requester, id: i64) -> Result<Document, ApiError> {
    let document = state.documents().get_document(id).await?;
    if !can_view(requester, &document) {
        tracing::warn!("User {} tried to read hidden document {}", requester.user_id, id);
        return Err(ApiError::not_found(format!("Document {} not found", id)));
    }
    Ok(document)
}
