use crate::database::models::Document;

use super::role::{Requester, Role};

/// Whether `requester` may read `document`.
///
/// Precedence: admin, then public flag, then unit match. A non-admin without a unit only ever
/// sees public documents.
pub fn can_view(requester: &Requester, document: &Document) -> bool {
    if requester.role == Role::Admin {
        return true;
    }
    if document.is_public {
        return true;
    }
    matches!(requester.opd_id, Some(opd_id) if opd_id == document.opd_id)
}
