//! Organisational-unit lifecycle guard.
//!
//! A unit may only be removed once nothing refers to it. Users are checked before documents so a
//! unit with both kinds of dependents always reports [`BlockReason::HasUsers`].

use serde::Serialize;
use std::fmt;

use crate::database::Dependents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    HasUsers,
    HasDocuments,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::HasUsers => "has users",
            BlockReason::HasDocuments => "has documents",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Ok` when the unit may be deleted, otherwise the first blocking reason.
pub fn check_dependents(dependents: &Dependents) -> Result<(), BlockReason> {
    if dependents.users > 0 {
        return Err(BlockReason::HasUsers);
    }
    if dependents.documents > 0 {
        return Err(BlockReason::HasDocuments);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_block_regardless_of_documents() {
        assert_eq!(check_dependents(&Dependents { users: 1, documents: 0 }), Err(BlockReason::HasUsers));
        assert_eq!(check_dependents(&Dependents { users: 2, documents: 9 }), Err(BlockReason::HasUsers));
    }

    #[test]
    fn documents_block_once_users_are_gone() {
        assert_eq!(check_dependents(&Dependents { users: 0, documents: 1 }), Err(BlockReason::HasDocuments));
        assert_eq!(check_dependents(&Dependents::default()), Ok(()));
    }

    #[test]
    fn reasons_have_stable_messages() {
        assert_eq!(BlockReason::HasUsers.to_string(), "has users");
        assert_eq!(BlockReason::HasDocuments.to_string(), "has documents");
    }
}
