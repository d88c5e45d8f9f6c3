use std::sync::Arc;
use tracing::{info, warn};

use crate::database::models::Opd;
use crate::database::{ArchiveStore, NewOpd, OpdChanges, OpdDeletion};
use crate::services::error::ServiceError;
use crate::services::opd_guard::{check_dependents, BlockReason};

/// Create, update and guarded delete of organisational units.
pub struct OpdService {
    store: Arc<dyn ArchiveStore>,
}

impl OpdService {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Opd>, ServiceError> {
        Ok(self.store.list_opds().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Opd, ServiceError> {
        self.store
            .find_opd(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("opd", id))
    }

    pub async fn create(&self, input: NewOpd) -> Result<Opd, ServiceError> {
        let input = NewOpd {
            name: required("name", &input.name)?,
            code: required("code", &input.code)?,
            description: input.description,
        };
        if self.store.find_opd_by_code(&input.code).await?.is_some() {
            return Err(ServiceError::Conflict(format!("unit code {}", input.code)));
        }
        let opd = self.store.insert_opd(input).await?;
        info!("Created unit {} ({})", opd.code, opd.id);
        Ok(opd)
    }

    pub async fn update(&self, id: i64, mut changes: OpdChanges) -> Result<Opd, ServiceError> {
        self.get(id).await?;
        if let Some(name) = &changes.name {
            changes.name = Some(required("name", name)?);
        }
        if let Some(code) = &changes.code {
            let code = required("code", code)?;
            if let Some(existing) = self.store.find_opd_by_code(&code).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!("unit code {}", code)));
                }
            }
            changes.code = Some(code);
        }
        self.store
            .update_opd(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("opd", id))
    }

    /// Dry run of [`delete`](Self::delete): reports whether the unit could be removed right now.
    pub async fn can_delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        let dependents = self.store.opd_dependents(id).await?;
        check_dependents(&dependents).map_err(ServiceError::Blocked)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        match self.store.delete_opd_if_unreferenced(id).await? {
            OpdDeletion::Deleted => {
                info!("Deleted unit {}", id);
                Ok(true)
            }
            OpdDeletion::Missing => Err(ServiceError::not_found("opd", id)),
            OpdDeletion::Blocked(dependents) => {
                let reason = check_dependents(&dependents).err().unwrap_or(BlockReason::HasUsers);
                warn!("Refused to delete unit {}: {}", id, reason);
                Err(ServiceError::Blocked(reason))
            }
        }
    }
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::invalid(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::database::UserChanges;
    use crate::testing::{new_document, new_user, Seeded};

    fn unit(code: &str) -> NewOpd {
        NewOpd { name: format!("Unit {}", code), code: code.to_string(), description: None }
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());

        let err = service.create(unit("DISDIK")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = service
            .update(seeded.dinkes.id, OpdChanges { code: Some("DISDIK".to_string()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_clears_description_and_keeps_name() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());
        let opd = service
            .create(NewOpd { description: Some("lama".to_string()), ..unit("BAPPEDA") })
            .await
            .unwrap();

        let updated = service
            .update(opd.id, OpdChanges { description: Some(None), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, opd.name);

        assert!(matches!(
            service.update(999, OpdChanges::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());
        assert!(matches!(service.create(unit("  ")).await, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn delete_blocked_by_users_before_documents() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());

        // DISDIK has users and, after this, documents too
        seeded.document("Rencana", seeded.disdik.id, false).await;
        assert!(matches!(
            service.delete(seeded.disdik.id).await,
            Err(ServiceError::Blocked(BlockReason::HasUsers))
        ));
        assert!(matches!(
            service.can_delete(seeded.disdik.id).await,
            Err(ServiceError::Blocked(BlockReason::HasUsers))
        ));
        assert!(service.get(seeded.disdik.id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_blocked_by_documents_without_users() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());
        seeded
            .store
            .insert_document(new_document("Laporan", seeded.dinkes.id, seeded.admin.id, true))
            .await
            .unwrap();

        assert!(matches!(
            service.delete(seeded.dinkes.id).await,
            Err(ServiceError::Blocked(BlockReason::HasDocuments))
        ));
    }

    #[tokio::test]
    async fn delete_succeeds_without_dependents() {
        let seeded = Seeded::new().await;
        let service = OpdService::new(seeded.store.clone());

        let opd = service.create(unit("DISHUB")).await.unwrap();
        let user = seeded.store.insert_user(new_user("dishub", Role::Staf, Some(opd.id))).await.unwrap();
        assert!(service.can_delete(opd.id).await.is_err());

        // Soft-deleted users still reference the unit; reassigning them releases it
        seeded
            .store
            .update_user(user.id, UserChanges { opd_id: Some(None), ..Default::default() })
            .await
            .unwrap();
        assert!(service.can_delete(opd.id).await.is_ok());
        assert!(service.delete(opd.id).await.unwrap());
        assert!(matches!(service.delete(opd.id).await, Err(ServiceError::NotFound(_))));
    }
}
