//! Pet repository
//!
//! Database operations for pet listings, including the public browse query.
//! The filter surface is translated into a single SQL statement; there is no
//! query planning beyond appending predicates.

use crate::db::DbPool;
use crate::models::{ListingType, Pet, PetFilter, PetGender, PetSize};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::sync::Arc;

/// Pet repository trait
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Create a new pet listing
    async fn create(&self, pet: &Pet) -> Result<Pet>;

    /// Get pet by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>>;

    /// Update a pet listing
    async fn update(&self, pet: &Pet) -> Result<Pet>;

    /// Delete a pet listing
    async fn delete(&self, id: i64) -> Result<()>;

    /// Set the adopted flag
    async fn set_adopted(&self, id: i64, adopted: bool) -> Result<()>;

    /// List all pets posted by one shelter, newest first
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>>;

    /// Public filtered listing
    async fn list_public(&self, filter: &PetFilter, offset: i64, limit: i64) -> Result<Vec<Pet>>;

    /// Count results of the public filtered listing
    async fn count_public(&self, filter: &PetFilter) -> Result<i64>;
}

/// SQLx-based pet repository implementation
pub struct SqlxPetRepository {
    pool: DbPool,
}

impl SqlxPetRepository {
    /// Create a new SQLx pet repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PetRepository> {
        Arc::new(Self::new(pool))
    }
}

const PET_COLUMNS: &str = "id, name, species, breed, gender, size, age_months, description, \
     image_urls, listing_type, price, currency, is_negotiable, is_adopted, posted_by, \
     created_at, updated_at";

#[async_trait]
impl PetRepository for SqlxPetRepository {
    async fn create(&self, pet: &Pet) -> Result<Pet> {
        let now = Utc::now();
        let image_urls =
            serde_json::to_string(&pet.image_urls).context("Failed to encode image URLs")?;

        let result = sqlx::query(
            r#"
            INSERT INTO pets (name, species, breed, gender, size, age_months, description,
                              image_urls, listing_type, price, currency, is_negotiable,
                              is_adopted, posted_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.gender.to_string())
        .bind(pet.size.to_string())
        .bind(pet.age_months)
        .bind(&pet.description)
        .bind(&image_urls)
        .bind(pet.listing_type.to_string())
        .bind(pet.price)
        .bind(&pet.currency)
        .bind(pet.is_negotiable)
        .bind(pet.is_adopted)
        .bind(pet.posted_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create pet")?;

        let id = result.last_insert_rowid();

        Ok(Pet {
            id,
            created_at: now,
            updated_at: now,
            ..pet.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>> {
        let row = sqlx::query(&format!("SELECT {} FROM pets WHERE id = ?", PET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get pet by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_pet(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, pet: &Pet) -> Result<Pet> {
        let now = Utc::now();
        let image_urls =
            serde_json::to_string(&pet.image_urls).context("Failed to encode image URLs")?;

        sqlx::query(
            r#"
            UPDATE pets
            SET name = ?, species = ?, breed = ?, gender = ?, size = ?, age_months = ?,
                description = ?, image_urls = ?, listing_type = ?, price = ?, currency = ?,
                is_negotiable = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.gender.to_string())
        .bind(pet.size.to_string())
        .bind(pet.age_months)
        .bind(&pet.description)
        .bind(&image_urls)
        .bind(pet.listing_type.to_string())
        .bind(pet.price)
        .bind(&pet.currency)
        .bind(pet.is_negotiable)
        .bind(now)
        .bind(pet.id)
        .execute(&self.pool)
        .await
        .context("Failed to update pet")?;

        self.get_by_id(pet.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Pet not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM pets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete pet")?;

        Ok(())
    }

    async fn set_adopted(&self, id: i64, adopted: bool) -> Result<()> {
        sqlx::query("UPDATE pets SET is_adopted = ?, updated_at = ? WHERE id = ?")
            .bind(adopted)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set adopted flag")?;

        Ok(())
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pets WHERE posted_by = ? ORDER BY created_at DESC",
            PET_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pets by owner")?;

        rows.iter().map(row_to_pet).collect()
    }

    async fn list_public(&self, filter: &PetFilter, offset: i64, limit: i64) -> Result<Vec<Pet>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM pets WHERE 1=1", PET_COLUMNS));
        push_filter(&mut builder, filter);

        builder.push(format!(
            " ORDER BY {} {}",
            filter.sort.column(),
            filter.direction.keyword()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list pets")?;

        rows.iter().map(row_to_pet).collect()
    }

    async fn count_public(&self, filter: &PetFilter) -> Result<i64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) as count FROM pets WHERE 1=1");
        push_filter(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count pets")?;

        Ok(row.get("count"))
    }
}

/// Append the filter predicates to a query builder.
///
/// Shared between the list and count queries so both always agree.
fn push_filter(builder: &mut QueryBuilder<Sqlite>, filter: &PetFilter) {
    if !filter.include_adopted {
        builder.push(" AND is_adopted = 0");
    }
    if let Some(ref species) = filter.species {
        builder.push(" AND species = ");
        builder.push_bind(species.clone());
    }
    if let Some(gender) = filter.gender {
        builder.push(" AND gender = ");
        builder.push_bind(gender.to_string());
    }
    if let Some(size) = filter.size {
        builder.push(" AND size = ");
        builder.push_bind(size.to_string());
    }
    if let Some(listing_type) = filter.listing_type {
        builder.push(" AND listing_type = ");
        builder.push_bind(listing_type.to_string());
    }
    if let Some(ref query) = filter.query {
        let pattern = format!("%{}%", query);
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR breed LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max_price);
    }
}

fn row_to_pet(row: &sqlx::sqlite::SqliteRow) -> Result<Pet> {
    let gender_str: String = row.get("gender");
    let size_str: String = row.get("size");
    let listing_str: String = row.get("listing_type");
    let image_urls_json: String = row.get("image_urls");

    Ok(Pet {
        id: row.get("id"),
        name: row.get("name"),
        species: row.get("species"),
        breed: row.get("breed"),
        gender: PetGender::from_str(&gender_str)
            .with_context(|| format!("Invalid gender in database: {}", gender_str))?,
        size: PetSize::from_str(&size_str)
            .with_context(|| format!("Invalid size in database: {}", size_str))?,
        age_months: row.get("age_months"),
        description: row.get("description"),
        image_urls: serde_json::from_str(&image_urls_json)
            .context("Invalid image URL list in database")?,
        listing_type: ListingType::from_str(&listing_str)
            .with_context(|| format!("Invalid listing type in database: {}", listing_str))?,
        price: row.get("price"),
        currency: row.get("currency"),
        is_negotiable: row.get("is_negotiable"),
        is_adopted: row.get("is_adopted"),
        posted_by: row.get("posted_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{PetSortKey, SortDirection, User, UserRole};

    async fn setup() -> (SqlxPetRepository, i64) {
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
            .expect("Failed to create shelter");

        (SqlxPetRepository::new(pool), shelter.id)
    }

    fn adoption_pet(name: &str, species: &str, owner: i64) -> Pet {
        let now = Utc::now();
        Pet {
            id: 0,
            name: name.to_string(),
            species: species.to_string(),
            breed: "Mixed".to_string(),
            gender: PetGender::Male,
            size: PetSize::Medium,
            age_months: Some(24),
            description: "Friendly and playful".to_string(),
            image_urls: vec!["https://img.example/1.jpg".to_string()],
            listing_type: ListingType::Adoption,
            price: None,
            currency: None,
            is_negotiable: None,
            is_adopted: false,
            posted_by: owner,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale_pet(name: &str, price: f64, owner: i64) -> Pet {
        Pet {
            listing_type: ListingType::Sale,
            price: Some(price),
            currency: Some("USD".to_string()),
            is_negotiable: Some(true),
            ..adoption_pet(name, "dog", owner)
        }
    }

    #[tokio::test]
    async fn test_create_and_get_pet() {
        let (repo, shelter_id) = setup().await;
        let pet = adoption_pet("Rex", "dog", shelter_id);

        let created = repo.create(&pet).await.expect("Failed to create pet");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get pet")
            .expect("Pet not found");

        assert_eq!(found.name, "Rex");
        assert_eq!(found.image_urls, vec!["https://img.example/1.jpg"]);
        assert_eq!(found.listing_type, ListingType::Adoption);
        assert!(found.price.is_none());
    }

    #[tokio::test]
    async fn test_sale_pricing_roundtrip() {
        let (repo, shelter_id) = setup().await;
        let pet = sale_pet("Bella", 250.0, shelter_id);

        let created = repo.create(&pet).await.expect("Failed to create pet");
        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get pet")
            .expect("Pet not found");

        assert_eq!(found.price, Some(250.0));
        assert_eq!(found.currency.as_deref(), Some("USD"));
        assert_eq!(found.is_negotiable, Some(true));
    }

    #[tokio::test]
    async fn test_set_adopted() {
        let (repo, shelter_id) = setup().await;
        let created = repo
            .create(&adoption_pet("Rex", "dog", shelter_id))
            .await
            .unwrap();

        repo.set_adopted(created.id, true).await.expect("Failed to flip");

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(found.is_adopted);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let (repo, shelter_id) = setup().await;
        repo.create(&adoption_pet("Rex", "dog", shelter_id)).await.unwrap();
        repo.create(&adoption_pet("Whiskers", "cat", shelter_id)).await.unwrap();

        let pets = repo.list_by_owner(shelter_id).await.expect("Failed to list");
        assert_eq!(pets.len(), 2);
    }

    #[tokio::test]
    async fn test_public_list_excludes_adopted_by_default() {
        let (repo, shelter_id) = setup().await;
        let kept = repo.create(&adoption_pet("Rex", "dog", shelter_id)).await.unwrap();
        let adopted = repo.create(&adoption_pet("Waldo", "dog", shelter_id)).await.unwrap();
        repo.set_adopted(adopted.id, true).await.unwrap();

        let filter = PetFilter::default();
        let pets = repo.list_public(&filter, 0, 10).await.expect("Failed to list");
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].id, kept.id);
        assert_eq!(repo.count_public(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_public_list_species_filter() {
        let (repo, shelter_id) = setup().await;
        repo.create(&adoption_pet("Rex", "dog", shelter_id)).await.unwrap();
        repo.create(&adoption_pet("Whiskers", "cat", shelter_id)).await.unwrap();

        let filter = PetFilter {
            species: Some("cat".to_string()),
            ..Default::default()
        };
        let pets = repo.list_public(&filter, 0, 10).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "Whiskers");
    }

    #[tokio::test]
    async fn test_public_list_free_text_search() {
        let (repo, shelter_id) = setup().await;
        let mut pet = adoption_pet("Rex", "dog", shelter_id);
        pet.description = "Loves long walks in the park".to_string();
        repo.create(&pet).await.unwrap();
        repo.create(&adoption_pet("Whiskers", "cat", shelter_id)).await.unwrap();

        let filter = PetFilter {
            query: Some("walks".to_string()),
            ..Default::default()
        };
        let pets = repo.list_public(&filter, 0, 10).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "Rex");
    }

    #[tokio::test]
    async fn test_public_list_price_range() {
        let (repo, shelter_id) = setup().await;
        repo.create(&sale_pet("Cheap", 50.0, shelter_id)).await.unwrap();
        repo.create(&sale_pet("Mid", 250.0, shelter_id)).await.unwrap();
        repo.create(&sale_pet("Pricey", 900.0, shelter_id)).await.unwrap();

        let filter = PetFilter {
            listing_type: Some(ListingType::Sale),
            min_price: Some(100.0),
            max_price: Some(500.0),
            ..Default::default()
        };
        let pets = repo.list_public(&filter, 0, 10).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "Mid");
    }

    #[tokio::test]
    async fn test_public_list_sort_by_price_asc() {
        let (repo, shelter_id) = setup().await;
        repo.create(&sale_pet("B", 300.0, shelter_id)).await.unwrap();
        repo.create(&sale_pet("A", 100.0, shelter_id)).await.unwrap();
        repo.create(&sale_pet("C", 200.0, shelter_id)).await.unwrap();

        let filter = PetFilter {
            listing_type: Some(ListingType::Sale),
            sort: PetSortKey::Price,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let pets = repo.list_public(&filter, 0, 10).await.unwrap();
        let prices: Vec<f64> = pets.iter().map(|p| p.price.unwrap()).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);
    }

    #[tokio::test]
    async fn test_public_list_pagination() {
        let (repo, shelter_id) = setup().await;
        for i in 0..5 {
            repo.create(&adoption_pet(&format!("pet{}", i), "dog", shelter_id))
                .await
                .unwrap();
        }

        let filter = PetFilter::default();
        let page1 = repo.list_public(&filter, 0, 2).await.unwrap();
        let page2 = repo.list_public(&filter, 2, 2).await.unwrap();

        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_ne!(page1[0].id, page2[0].id);
        assert_eq!(repo.count_public(&filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_delete_pet() {
        let (repo, shelter_id) = setup().await;
        let created = repo.create(&adoption_pet("Rex", "dog", shelter_id)).await.unwrap();

        repo.delete(created.id).await.expect("Failed to delete");

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
