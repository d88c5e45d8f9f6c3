use serde_json::{json, Value};

use crate::database::models::Document;

use super::role::{Requester, Role};

/// Set-membership form of the visibility rule, suitable for pushing down into a storage filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Every row. Only reachable by an admin who opted into private documents.
    All,
    PublicOnly,
    PublicOrUnit(i64),
}

impl VisibilityScope {
    /// Base scope for a listing or search.
    ///
    /// Without `include_private` every role, admin included, is limited to public documents.
    pub fn for_requester(requester: &Requester, include_private: bool) -> Self {
        if !include_private {
            return VisibilityScope::PublicOnly;
        }
        match (requester.role, requester.opd_id) {
            (Role::Admin, _) => VisibilityScope::All,
            (_, Some(opd_id)) => VisibilityScope::PublicOrUnit(opd_id),
            (_, None) => VisibilityScope::PublicOnly,
        }
    }

    pub fn admits(&self, document: &Document) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::PublicOnly => document.is_public,
            VisibilityScope::PublicOrUnit(opd_id) => document.is_public || document.opd_id == *opd_id,
        }
    }

    /// Filter DSL condition for this scope; `None` imposes no constraint.
    pub fn to_where(&self) -> Option<Value> {
        match self {
            VisibilityScope::All => None,
            VisibilityScope::PublicOnly => Some(json!({ "is_public": true })),
            VisibilityScope::PublicOrUnit(opd_id) => Some(json!({
                "$or": [
                    { "is_public": true },
                    { "opd_id": opd_id }
                ]
            })),
        }
    }
}
