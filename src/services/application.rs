//! Adoption application service
//!
//! Owns the application workflow: creation by interested adopters and status
//! transitions driven by the shelter that owns the referenced pet. Status
//! changes fan out a notification to the other party; a notification write
//! failure is logged and never fails the request.

use crate::db::repositories::{ApplicationRepository, NotificationRepository, PetRepository};
use crate::models::{
    AdoptionApplication, ApplicationStatus, Notification, NotificationKind, Pet, User,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for application service operations
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    /// Validation error (invalid input or transition)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Application or referenced pet not found
    #[error("{0}")]
    NotFound(String),

    /// Acting user is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Adoption application service
pub struct ApplicationService {
    repo: Arc<dyn ApplicationRepository>,
    pet_repo: Arc<dyn PetRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl ApplicationService {
    pub fn new(
        repo: Arc<dyn ApplicationRepository>,
        pet_repo: Arc<dyn PetRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            repo,
            pet_repo,
            notification_repo,
        }
    }

    /// Express interest in a pet: create a Pending application.
    ///
    /// Rejected when the applicant is a shelter, owns the pet, the pet is
    /// already adopted, or a pending application for the same pet exists.
    pub async fn express_interest(
        &self,
        applicant: &User,
        pet_id: i64,
        message: Option<String>,
    ) -> Result<AdoptionApplication, ApplicationServiceError> {
        if applicant.is_shelter() {
            return Err(ApplicationServiceError::Forbidden(
                "Shelters cannot apply for pets".to_string(),
            ));
        }

        let pet = self.pet(pet_id).await?;

        if pet.posted_by == applicant.id {
            return Err(ApplicationServiceError::Forbidden(
                "You cannot apply for your own listing".to_string(),
            ));
        }

        if pet.is_adopted {
            return Err(ApplicationServiceError::ValidationError(
                "This pet has already been adopted".to_string(),
            ));
        }

        if self
            .repo
            .has_pending(pet_id, applicant.id)
            .await
            .context("Failed to check pending application")?
        {
            return Err(ApplicationServiceError::ValidationError(
                "You already have a pending application for this pet".to_string(),
            ));
        }

        let now = Utc::now();
        let application = AdoptionApplication {
            id: 0,
            pet_id,
            applicant_id: applicant.id,
            message,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&application)
            .await
            .context("Failed to create application")?;

        self.notify(
            pet.posted_by,
            NotificationKind::ApplicationReceived,
            format!("{} applied to adopt {}", applicant.username, pet.name),
            Some(created.id),
        )
        .await;

        Ok(created)
    }

    /// Change the status of an application.
    ///
    /// Only the shelter owning the referenced pet may do this, and only along
    /// the allowed transitions.
    pub async fn update_status(
        &self,
        acting_user_id: i64,
        application_id: i64,
        new_status: ApplicationStatus,
    ) -> Result<AdoptionApplication, ApplicationServiceError> {
        let application = self
            .repo
            .get_by_id(application_id)
            .await
            .context("Failed to get application")?
            .ok_or_else(|| ApplicationServiceError::NotFound("Application not found".to_string()))?;

        let pet = self.pet(application.pet_id).await?;

        if pet.posted_by != acting_user_id {
            return Err(ApplicationServiceError::Forbidden(
                "Only the shelter that posted this pet may review its applications".to_string(),
            ));
        }

        if !application.status.can_transition_to(new_status) {
            return Err(ApplicationServiceError::ValidationError(format!(
                "Cannot change application status from {} to {}",
                application.status, new_status
            )));
        }

        self.repo
            .update_status(application_id, new_status)
            .await
            .context("Failed to update application status")?;

        self.notify(
            application.applicant_id,
            NotificationKind::ApplicationStatus,
            format!("Your application for {} is now {}", pet.name, new_status),
            Some(application_id),
        )
        .await;

        let updated = self
            .repo
            .get_by_id(application_id)
            .await
            .context("Failed to reload application")?
            .ok_or_else(|| ApplicationServiceError::NotFound("Application not found".to_string()))?;

        Ok(updated)
    }

    /// Applications submitted by one user
    pub async fn list_mine(
        &self,
        applicant_id: i64,
    ) -> Result<Vec<AdoptionApplication>, ApplicationServiceError> {
        let applications = self
            .repo
            .list_by_applicant(applicant_id)
            .await
            .context("Failed to list applications")?;

        Ok(applications)
    }

    /// Applications received across all of a shelter's pets
    pub async fn list_received(
        &self,
        shelter_id: i64,
    ) -> Result<Vec<AdoptionApplication>, ApplicationServiceError> {
        let applications = self
            .repo
            .list_by_shelter(shelter_id)
            .await
            .context("Failed to list applications")?;

        Ok(applications)
    }

    async fn pet(&self, pet_id: i64) -> Result<Pet, ApplicationServiceError> {
        self.pet_repo
            .get_by_id(pet_id)
            .await
            .context("Failed to get pet")?
            .ok_or_else(|| ApplicationServiceError::NotFound("Pet not found".to_string()))
    }

    async fn notify(&self, user_id: i64, kind: NotificationKind, message: String, related_id: Option<i64>) {
        let notification = Notification {
            id: 0,
            user_id,
            kind,
            message,
            related_id,
            is_read: false,
            created_at: Utc::now(),
        };

        if let Err(e) = self.notification_repo.create(&notification).await {
            tracing::warn!("Failed to write notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        NotificationRepository, SqlxApplicationRepository, SqlxNotificationRepository,
        SqlxPetRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreatePetInput, ListingType, PetGender, PetSize, UserRole};
    use crate::services::pet::PetService;

    struct Fixture {
        service: ApplicationService,
        notifications: Arc<SqlxNotificationRepository>,
        shelter: User,
        adopter: User,
        pet_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let shelter = user_repo
            .create(&User::new(
                "shelter".to_string(),
                "shelter@example.com".to_string(),
                "hash".to_string(),
                UserRole::Shelter,
            ))
            .await
            .unwrap();
        let adopter = user_repo
            .create(&User::new(
                "adopter".to_string(),
                "adopter@example.com".to_string(),
                "hash".to_string(),
                UserRole::Adopter,
            ))
            .await
            .unwrap();

        let pet_repo = Arc::new(SqlxPetRepository::new(pool.clone()));
        let pet_service = PetService::new(pet_repo.clone());
        let pet = pet_service
            .create_listing(
                shelter.id,
                CreatePetInput {
                    name: "Rex".to_string(),
                    species: "dog".to_string(),
                    breed: "Labrador".to_string(),
                    gender: PetGender::Male,
                    size: PetSize::Large,
                    age_months: Some(18),
                    description: String::new(),
                    image_urls: vec![],
                    listing_type: ListingType::Adoption,
                    price: None,
                    currency: None,
                    is_negotiable: None,
                },
            )
            .await
            .unwrap();

        let notifications = Arc::new(SqlxNotificationRepository::new(pool.clone()));
        let service = ApplicationService::new(
            Arc::new(SqlxApplicationRepository::new(pool)),
            pet_repo,
            notifications.clone(),
        );

        Fixture {
            service,
            notifications,
            shelter,
            adopter,
            pet_id: pet.id,
        }
    }

    #[tokio::test]
    async fn test_express_interest_creates_pending() {
        let f = setup().await;

        let application = f
            .service
            .express_interest(&f.adopter, f.pet_id, Some("We love labs".to_string()))
            .await
            .expect("Failed to express interest");

        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.applicant_id, f.adopter.id);

        // Shelter got notified
        let inbox = f.notifications.list_by_user(f.shelter.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::ApplicationReceived);
    }

    #[tokio::test]
    async fn test_shelter_cannot_apply() {
        let f = setup().await;

        let result = f.service.express_interest(&f.shelter, f.pet_id, None).await;
        assert!(matches!(result, Err(ApplicationServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_cannot_apply_for_missing_pet() {
        let f = setup().await;

        let result = f.service.express_interest(&f.adopter, 999, None).await;
        assert!(matches!(result, Err(ApplicationServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_pending_application_rejected() {
        let f = setup().await;

        f.service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .expect("First application should succeed");

        let result = f.service.express_interest(&f.adopter, f.pet_id, None).await;
        assert!(matches!(
            result,
            Err(ApplicationServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_can_reapply_after_rejection() {
        let f = setup().await;

        let application = f
            .service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .unwrap();
        f.service
            .update_status(f.shelter.id, application.id, ApplicationStatus::Rejected)
            .await
            .unwrap();

        let second = f.service.express_interest(&f.adopter, f.pet_id, None).await;
        assert!(second.is_ok(), "Terminal applications do not block re-applying");
    }

    #[tokio::test]
    async fn test_update_status_happy_path() {
        let f = setup().await;

        let application = f
            .service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .unwrap();

        let contacted = f
            .service
            .update_status(f.shelter.id, application.id, ApplicationStatus::Contacted)
            .await
            .expect("Pending -> Contacted should succeed");
        assert_eq!(contacted.status, ApplicationStatus::Contacted);

        let approved = f
            .service
            .update_status(f.shelter.id, application.id, ApplicationStatus::Approved)
            .await
            .expect("Contacted -> Approved should succeed");
        assert_eq!(approved.status, ApplicationStatus::Approved);

        // Applicant was notified for each change
        let inbox = f.notifications.list_by_user(f.adopter.id).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox
            .iter()
            .all(|n| n.kind == NotificationKind::ApplicationStatus));
    }

    #[tokio::test]
    async fn test_update_status_only_owner_shelter() {
        let f = setup().await;

        let application = f
            .service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .unwrap();

        // The applicant cannot review their own application
        let result = f
            .service
            .update_status(f.adopter.id, application.id, ApplicationStatus::Approved)
            .await;
        assert!(matches!(result, Err(ApplicationServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_terminal_status_cannot_change() {
        let f = setup().await;

        let application = f
            .service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .unwrap();

        f.service
            .update_status(f.shelter.id, application.id, ApplicationStatus::Approved)
            .await
            .unwrap();

        let result = f
            .service
            .update_status(f.shelter.id, application.id, ApplicationStatus::Rejected)
            .await;
        assert!(matches!(
            result,
            Err(ApplicationServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_apply_for_adopted_pet() {
        let f = setup().await;

        // Mark the pet adopted directly
        let pet_repo = &f.service.pet_repo;
        pet_repo.set_adopted(f.pet_id, true).await.unwrap();

        let result = f.service.express_interest(&f.adopter, f.pet_id, None).await;
        assert!(matches!(
            result,
            Err(ApplicationServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_mine_and_received() {
        let f = setup().await;

        f.service
            .express_interest(&f.adopter, f.pet_id, None)
            .await
            .unwrap();

        let mine = f.service.list_mine(f.adopter.id).await.unwrap();
        assert_eq!(mine.len(), 1);

        let received = f.service.list_received(f.shelter.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(mine[0].id, received[0].id);
    }
}
