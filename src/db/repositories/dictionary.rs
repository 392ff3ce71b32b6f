//! Pet dictionary repository
//!
//! Read-mostly catalog access plus the startup seed path. Ordinary users
//! never write to this table.

use crate::db::DbPool;
use crate::models::{DictionaryEntry, DictionaryFilter, SpeciesCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Dictionary repository trait
#[async_trait]
pub trait DictionaryRepository: Send + Sync {
    /// Insert an entry (seed path)
    async fn insert(&self, entry: &DictionaryEntry) -> Result<DictionaryEntry>;

    /// Get entry by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<DictionaryEntry>>;

    /// Filtered catalog listing
    async fn list(
        &self,
        filter: &DictionaryFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DictionaryEntry>>;

    /// Count results of the filtered listing
    async fn count(&self, filter: &DictionaryFilter) -> Result<i64>;

    /// Total number of entries, used to decide whether to seed
    async fn count_all(&self) -> Result<i64>;

    /// Entry counts grouped by species
    async fn stats_by_species(&self) -> Result<Vec<SpeciesCount>>;
}

/// SQLx-based dictionary repository implementation
pub struct SqlxDictionaryRepository {
    pool: DbPool,
}

impl SqlxDictionaryRepository {
    /// Create a new SQLx dictionary repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn DictionaryRepository> {
        Arc::new(Self::new(pool))
    }
}

const ENTRY_COLUMNS: &str =
    "id, species, breed, origin, size_class, life_span_years, temperament, description, image_url";

#[async_trait]
impl DictionaryRepository for SqlxDictionaryRepository {
    async fn insert(&self, entry: &DictionaryEntry) -> Result<DictionaryEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO dictionary_entries (species, breed, origin, size_class, life_span_years,
                                            temperament, description, image_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.species)
        .bind(&entry.breed)
        .bind(&entry.origin)
        .bind(&entry.size_class)
        .bind(entry.life_span_years)
        .bind(&entry.temperament)
        .bind(&entry.description)
        .bind(&entry.image_url)
        .execute(&self.pool)
        .await
        .context("Failed to insert dictionary entry")?;

        Ok(DictionaryEntry {
            id: result.last_insert_rowid(),
            ..entry.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DictionaryEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM dictionary_entries WHERE id = ?",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get dictionary entry")?;

        Ok(row.map(|row| row_to_entry(&row)))
    }

    async fn list(
        &self,
        filter: &DictionaryFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DictionaryEntry>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM dictionary_entries WHERE 1=1",
            ENTRY_COLUMNS
        ));
        push_filter(&mut builder, filter);

        if filter.sort_by_life_span {
            builder.push(" ORDER BY life_span_years DESC, breed ASC");
        } else {
            builder.push(" ORDER BY breed ASC");
        }
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list dictionary entries")?;

        Ok(rows.iter().map(row_to_entry).collect())
    }

    async fn count(&self, filter: &DictionaryFilter) -> Result<i64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) as count FROM dictionary_entries WHERE 1=1");
        push_filter(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count dictionary entries")?;

        Ok(row.get("count"))
    }

    async fn count_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dictionary_entries")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count dictionary entries")?;

        Ok(count)
    }

    async fn stats_by_species(&self) -> Result<Vec<SpeciesCount>> {
        let rows = sqlx::query(
            r#"
            SELECT species, COUNT(*) as count
            FROM dictionary_entries
            GROUP BY species
            ORDER BY count DESC, species ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate dictionary stats")?;

        Ok(rows
            .iter()
            .map(|row| SpeciesCount {
                species: row.get("species"),
                count: row.get("count"),
            })
            .collect())
    }
}

fn push_filter(builder: &mut QueryBuilder<Sqlite>, filter: &DictionaryFilter) {
    if let Some(ref species) = filter.species {
        builder.push(" AND species = ");
        builder.push_bind(species.clone());
    }
    if let Some(ref size_class) = filter.size_class {
        builder.push(" AND size_class = ");
        builder.push_bind(size_class.clone());
    }
    if let Some(ref query) = filter.query {
        let pattern = format!("%{}%", query);
        builder.push(" AND (breed LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> DictionaryEntry {
    DictionaryEntry {
        id: row.get("id"),
        species: row.get("species"),
        breed: row.get("breed"),
        origin: row.get("origin"),
        size_class: row.get("size_class"),
        life_span_years: row.get("life_span_years"),
        temperament: row.get("temperament"),
        description: row.get("description"),
        image_url: row.get("image_url"),
    }
}
