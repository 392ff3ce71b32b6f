//! Pet listing service
//!
//! Listing CRUD scoped to the owning shelter plus the public browse query.
//! Pricing fields are conditional on the listing type: sale listings require
//! a non-negative price, adoption listings carry no pricing at all.

use crate::db::repositories::PetRepository;
use crate::models::{
    CreatePetInput, ListParams, ListingType, PagedResult, Pet, PetFilter, UpdatePetInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for pet service operations
#[derive(Debug, thiserror::Error)]
pub enum PetServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Pet not found
    #[error("Pet not found")]
    NotFound,

    /// Acting user does not own the listing
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Pet service
pub struct PetService {
    repo: Arc<dyn PetRepository>,
}

impl PetService {
    pub fn new(repo: Arc<dyn PetRepository>) -> Self {
        Self { repo }
    }

    /// Create a new listing owned by `owner_id`.
    pub async fn create_listing(
        &self,
        owner_id: i64,
        input: CreatePetInput,
    ) -> Result<Pet, PetServiceError> {
        if input.name.trim().is_empty() {
            return Err(PetServiceError::ValidationError(
                "Pet name cannot be empty".to_string(),
            ));
        }
        if input.species.trim().is_empty() {
            return Err(PetServiceError::ValidationError(
                "Species cannot be empty".to_string(),
            ));
        }

        let (price, currency, is_negotiable) = validate_pricing(
            input.listing_type,
            input.price,
            input.currency,
            input.is_negotiable,
        )?;

        let now = Utc::now();
        let pet = Pet {
            id: 0,
            name: input.name.trim().to_string(),
            species: input.species.trim().to_lowercase(),
            breed: input.breed.trim().to_string(),
            gender: input.gender,
            size: input.size,
            age_months: input.age_months,
            description: input.description,
            image_urls: input.image_urls,
            listing_type: input.listing_type,
            price,
            currency,
            is_negotiable,
            is_adopted: false,
            posted_by: owner_id,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&pet)
            .await
            .context("Failed to create pet")?;

        Ok(created)
    }

    /// Get a listing by id
    pub async fn get(&self, id: i64) -> Result<Pet, PetServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get pet")?
            .ok_or(PetServiceError::NotFound)
    }

    /// Update a listing. Only the owning shelter may do this; conditional
    /// pricing is re-validated against the resulting listing type.
    pub async fn update_listing(
        &self,
        user_id: i64,
        pet_id: i64,
        input: UpdatePetInput,
    ) -> Result<Pet, PetServiceError> {
        let mut pet = self.owned_pet(user_id, pet_id).await?;

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(PetServiceError::ValidationError(
                    "Pet name cannot be empty".to_string(),
                ));
            }
            pet.name = name.trim().to_string();
        }
        if let Some(species) = input.species {
            pet.species = species.trim().to_lowercase();
        }
        if let Some(breed) = input.breed {
            pet.breed = breed.trim().to_string();
        }
        if let Some(gender) = input.gender {
            pet.gender = gender;
        }
        if let Some(size) = input.size {
            pet.size = size;
        }
        if let Some(age_months) = input.age_months {
            pet.age_months = Some(age_months);
        }
        if let Some(description) = input.description {
            pet.description = description;
        }
        if let Some(image_urls) = input.image_urls {
            pet.image_urls = image_urls;
        }
        if let Some(listing_type) = input.listing_type {
            pet.listing_type = listing_type;
        }
        if input.price.is_some() {
            pet.price = input.price;
        }
        if input.currency.is_some() {
            pet.currency = input.currency;
        }
        if input.is_negotiable.is_some() {
            pet.is_negotiable = input.is_negotiable;
        }

        let (price, currency, is_negotiable) =
            validate_pricing(pet.listing_type, pet.price, pet.currency, pet.is_negotiable)?;
        pet.price = price;
        pet.currency = currency;
        pet.is_negotiable = is_negotiable;

        let updated = self
            .repo
            .update(&pet)
            .await
            .context("Failed to update pet")?;

        Ok(updated)
    }

    /// Mark a listing adopted. Owner only.
    pub async fn mark_adopted(&self, user_id: i64, pet_id: i64) -> Result<Pet, PetServiceError> {
        self.owned_pet(user_id, pet_id).await?;

        self.repo
            .set_adopted(pet_id, true)
            .await
            .context("Failed to mark adopted")?;

        self.get(pet_id).await
    }

    /// Delete a listing. Owner only.
    pub async fn delete_listing(&self, user_id: i64, pet_id: i64) -> Result<(), PetServiceError> {
        self.owned_pet(user_id, pet_id).await?;

        self.repo
            .delete(pet_id)
            .await
            .context("Failed to delete pet")?;

        Ok(())
    }

    /// List the shelter's own listings, adopted included
    pub async fn list_mine(&self, owner_id: i64) -> Result<Vec<Pet>, PetServiceError> {
        let pets = self
            .repo
            .list_by_owner(owner_id)
            .await
            .context("Failed to list pets")?;

        Ok(pets)
    }

    /// Public filtered/sorted/paginated browse
    pub async fn browse(
        &self,
        filter: &PetFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Pet>, PetServiceError> {
        let items = self
            .repo
            .list_public(filter, params.offset(), params.limit())
            .await
            .context("Failed to list pets")?;
        let total = self
            .repo
            .count_public(filter)
            .await
            .context("Failed to count pets")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Fetch a pet and check it is owned by `user_id`
    async fn owned_pet(&self, user_id: i64, pet_id: i64) -> Result<Pet, PetServiceError> {
        let pet = self.get(pet_id).await?;

        if pet.posted_by != user_id {
            return Err(PetServiceError::Forbidden(
                "Only the shelter that posted this listing may modify it".to_string(),
            ));
        }

        Ok(pet)
    }
}

/// Normalize pricing fields against the listing type.
///
/// Sale listings require a non-negative price (currency defaults to USD);
/// adoption listings never carry pricing.
fn validate_pricing(
    listing_type: ListingType,
    price: Option<f64>,
    currency: Option<String>,
    is_negotiable: Option<bool>,
) -> Result<(Option<f64>, Option<String>, Option<bool>), PetServiceError> {
    match listing_type {
        ListingType::Sale => {
            let price = price.ok_or_else(|| {
                PetServiceError::ValidationError(
                    "Price is required for sale listings".to_string(),
                )
            })?;
            if price < 0.0 {
                return Err(PetServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
            let currency = currency.unwrap_or_else(|| "USD".to_string());
            Ok((Some(price), Some(currency), Some(is_negotiable.unwrap_or(false))))
        }
        ListingType::Adoption => Ok((None, None, None)),
    }
}
