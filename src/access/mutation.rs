use crate::database::models::Document;

use super::role::{Requester, Role};

/// Whether `requester` may edit the metadata of, or delete, `document`.
///
/// Edit and delete share this single predicate.
pub fn can_mutate(requester: &Requester, document: &Document) -> bool {
    can_write_unit(requester, document.opd_id)
}

/// Whether `requester` may upload to at least one unit.
pub fn can_upload(requester: &Requester) -> bool {
    match requester.role {
        Role::Admin => true,
        Role::Pengelola => requester.opd_id.is_some(),
        Role::Staf => false,
    }
}

/// Whether `requester` may upload a new document owned by `opd_id`.
pub fn can_upload_to(requester: &Requester, opd_id: i64) -> bool {
    can_write_unit(requester, opd_id)
}

fn can_write_unit(requester: &Requester, opd_id: i64) -> bool {
    match requester.role {
        Role::Admin => true,
        Role::Pengelola => requester.opd_id == Some(opd_id),
        Role::Staf => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::document_fixture;

    #[test]
    fn admin_mutates_any_unit() {
        let admin = Requester::new(1, Role::Admin, None);
        assert!(can_mutate(&admin, &document_fixture(1, 5, false)));
        assert!(can_upload_to(&admin, 42));
        assert!(can_upload(&admin));
    }

    #[test]
    fn pengelola_mutates_own_unit_only() {
        let pengelola = Requester::new(2, Role::Pengelola, Some(5));
        assert!(can_mutate(&pengelola, &document_fixture(1, 5, false)));
        assert!(!can_mutate(&pengelola, &document_fixture(2, 6, true)));
        assert!(can_upload_to(&pengelola, 5));
        assert!(!can_upload_to(&pengelola, 6));
        assert!(can_upload(&pengelola));
    }

    #[test]
    fn staf_never_mutates() {
        let staf = Requester::new(3, Role::Staf, Some(5));
        assert!(!can_mutate(&staf, &document_fixture(1, 5, false)));
        assert!(!can_mutate(&staf, &document_fixture(2, 5, true)));
        assert!(!can_upload_to(&staf, 5));
        assert!(!can_upload(&staf));
    }

    #[test]
    fn unitless_pengelola_cannot_write() {
        let pengelola = Requester::new(4, Role::Pengelola, None);
        assert!(!can_mutate(&pengelola, &document_fixture(1, 5, false)));
        assert!(!can_upload_to(&pengelola, 5));
        assert!(!can_upload(&pengelola));
    }
}
