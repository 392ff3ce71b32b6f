//! Adoption application repository

use crate::db::DbPool;
use crate::models::{AdoptionApplication, ApplicationStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Adoption application repository trait
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Create a new application
    async fn create(&self, application: &AdoptionApplication) -> Result<AdoptionApplication>;

    /// Get application by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<AdoptionApplication>>;

    /// Update the status of an application
    async fn update_status(&self, id: i64, status: ApplicationStatus) -> Result<()>;

    /// List applications submitted by one user, newest first
    async fn list_by_applicant(&self, applicant_id: i64) -> Result<Vec<AdoptionApplication>>;

    /// List applications for all pets posted by one shelter, newest first
    async fn list_by_shelter(&self, shelter_id: i64) -> Result<Vec<AdoptionApplication>>;

    /// Check whether the user already has a pending application for a pet
    async fn has_pending(&self, pet_id: i64, applicant_id: i64) -> Result<bool>;
}

/// SQLx-based application repository implementation
pub struct SqlxApplicationRepository {
    pool: DbPool,
}

impl SqlxApplicationRepository {
    /// Create a new SQLx application repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn ApplicationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ApplicationRepository for SqlxApplicationRepository {
    async fn create(&self, application: &AdoptionApplication) -> Result<AdoptionApplication> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO adoption_applications (pet_id, applicant_id, message, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(application.pet_id)
        .bind(application.applicant_id)
        .bind(&application.message)
        .bind(application.status.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create application")?;

        let id = result.last_insert_rowid();

        Ok(AdoptionApplication {
            id,
            created_at: now,
            updated_at: now,
            ..application.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AdoptionApplication>> {
        let row = sqlx::query(
            r#"
            SELECT id, pet_id, applicant_id, message, status, created_at, updated_at
            FROM adoption_applications
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get application by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_application(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_status(&self, id: i64, status: ApplicationStatus) -> Result<()> {
        sqlx::query("UPDATE adoption_applications SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update application status")?;

        Ok(())
    }

    async fn list_by_applicant(&self, applicant_id: i64) -> Result<Vec<AdoptionApplication>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pet_id, applicant_id, message, status, created_at, updated_at
            FROM adoption_applications
            WHERE applicant_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list applications by applicant")?;

        rows.iter().map(row_to_application).collect()
    }

    async fn list_by_shelter(&self, shelter_id: i64) -> Result<Vec<AdoptionApplication>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.pet_id, a.applicant_id, a.message, a.status, a.created_at, a.updated_at
            FROM adoption_applications a
            JOIN pets p ON p.id = a.pet_id
            WHERE p.posted_by = ?
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(shelter_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list applications by shelter")?;

        rows.iter().map(row_to_application).collect()
    }

    async fn has_pending(&self, pet_id: i64, applicant_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM adoption_applications
            WHERE pet_id = ? AND applicant_id = ? AND status = 'pending'
            "#,
        )
        .bind(pet_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check pending application")?;

        Ok(count > 0)
    }
}

fn row_to_application(row: &sqlx::sqlite::SqliteRow) -> Result<AdoptionApplication> {
    let status_str: String = row.get("status");
    let status = ApplicationStatus::from_str(&status_str)
        .with_context(|| format!("Invalid application status in database: {}", status_str))?;

    Ok(AdoptionApplication {
        id: row.get("id"),
        pet_id: row.get("pet_id"),
        applicant_id: row.get("applicant_id"),
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        PetRepository, SqlxPetRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ListingType, Pet, PetGender, PetSize, User, UserRole};

    struct Fixture {
        repo: SqlxApplicationRepository,
        shelter_id: i64,
        adopter_id: i64,
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

        let pet_repo = SqlxPetRepository::new(pool.clone());
        let now = Utc::now();
        let pet = pet_repo
            .create(&Pet {
                id: 0,
                name: "Rex".to_string(),
                species: "dog".to_string(),
                breed: "Mixed".to_string(),
                gender: PetGender::Male,
                size: PetSize::Medium,
                age_months: Some(12),
                description: String::new(),
                image_urls: vec![],
                listing_type: ListingType::Adoption,
                price: None,
                currency: None,
                is_negotiable: None,
                is_adopted: false,
                posted_by: shelter.id,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        Fixture {
            repo: SqlxApplicationRepository::new(pool),
            shelter_id: shelter.id,
            adopter_id: adopter.id,
            pet_id: pet.id,
        }
    }

    fn new_application(pet_id: i64, applicant_id: i64) -> AdoptionApplication {
        let now = Utc::now();
        AdoptionApplication {
            id: 0,
            pet_id,
            applicant_id,
            message: Some("We have a big yard".to_string()),
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let f = setup().await;
        let created = f
            .repo
            .create(&new_application(f.pet_id, f.adopter_id))
            .await
            .expect("Failed to create application");

        assert!(created.id > 0);
        assert_eq!(created.status, ApplicationStatus::Pending);

        let found = f
            .repo
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Application not found");
        assert_eq!(found.pet_id, f.pet_id);
        assert_eq!(found.message.as_deref(), Some("We have a big yard"));
    }

    #[tokio::test]
    async fn test_update_status() {
        let f = setup().await;
        let created = f
            .repo
            .create(&new_application(f.pet_id, f.adopter_id))
            .await
            .unwrap();

        f.repo
            .update_status(created.id, ApplicationStatus::Contacted)
            .await
            .expect("Failed to update status");

        let found = f.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.status, ApplicationStatus::Contacted);
    }

    #[tokio::test]
    async fn test_list_by_applicant() {
        let f = setup().await;
        f.repo
            .create(&new_application(f.pet_id, f.adopter_id))
            .await
            .unwrap();

        let mine = f.repo.list_by_applicant(f.adopter_id).await.unwrap();
        assert_eq!(mine.len(), 1);

        let none = f.repo.list_by_applicant(f.shelter_id).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_shelter() {
        let f = setup().await;
        f.repo
            .create(&new_application(f.pet_id, f.adopter_id))
            .await
            .unwrap();

        let received = f.repo.list_by_shelter(f.shelter_id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].pet_id, f.pet_id);
    }

    #[tokio::test]
    async fn test_has_pending() {
        let f = setup().await;
        assert!(!f.repo.has_pending(f.pet_id, f.adopter_id).await.unwrap());

        let created = f
            .repo
            .create(&new_application(f.pet_id, f.adopter_id))
            .await
            .unwrap();
        assert!(f.repo.has_pending(f.pet_id, f.adopter_id).await.unwrap());

        // Terminal applications no longer count as pending
        f.repo
            .update_status(created.id, ApplicationStatus::Rejected)
            .await
            .unwrap();
        assert!(!f.repo.has_pending(f.pet_id, f.adopter_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_application_requires_existing_pet() {
        let f = setup().await;
        let result = f.repo.create(&new_application(9999, f.adopter_id)).await;
        assert!(result.is_err(), "FK constraint should reject orphan application");
    }
}
