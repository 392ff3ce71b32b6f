//! Pet dictionary service
//!
//! Read path over the breed catalog with an in-process cache in front of the
//! list and stats queries. The catalog has no user-facing write path; a
//! built-in seed set is inserted at startup when the table is empty.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::DictionaryRepository;
use crate::models::{DictionaryEntry, DictionaryFilter, ListParams, PagedResult, SpeciesCount};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for catalog reads
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Built-in catalog seeded on first start
struct SeedEntry {
    species: &'static str,
    breed: &'static str,
    origin: &'static str,
    size_class: &'static str,
    life_span_years: i64,
    temperament: &'static str,
    description: &'static str,
}

const SEED_ENTRIES: &[SeedEntry] = &[
    SeedEntry {
        species: "dog",
        breed: "Labrador Retriever",
        origin: "Canada",
        size_class: "large",
        life_span_years: 12,
        temperament: "outgoing, even-tempered, gentle",
        description: "A friendly working breed that thrives in family homes and takes well to training.",
    },
    SeedEntry {
        species: "dog",
        breed: "Beagle",
        origin: "England",
        size_class: "medium",
        life_span_years: 13,
        temperament: "curious, merry, determined",
        description: "A small scent hound with a big voice. Needs company and secure fencing.",
    },
    SeedEntry {
        species: "dog",
        breed: "German Shepherd",
        origin: "Germany",
        size_class: "large",
        life_span_years: 11,
        temperament: "confident, courageous, loyal",
        description: "A versatile herding breed suited to experienced owners with time to train.",
    },
    SeedEntry {
        species: "dog",
        breed: "Poodle",
        origin: "France",
        size_class: "medium",
        life_span_years: 15,
        temperament: "intelligent, active, alert",
        description: "Highly trainable and low-shedding. Comes in toy, miniature and standard sizes.",
    },
    SeedEntry {
        species: "dog",
        breed: "Shiba Inu",
        origin: "Japan",
        size_class: "small",
        life_span_years: 14,
        temperament: "independent, alert, charming",
        description: "A compact spitz with a strong will of its own. Fastidious and quiet indoors.",
    },
    SeedEntry {
        species: "cat",
        breed: "Siamese",
        origin: "Thailand",
        size_class: "small",
        life_span_years: 15,
        temperament: "vocal, social, affectionate",
        description: "A talkative companion cat that bonds strongly with its people.",
    },
    SeedEntry {
        species: "cat",
        breed: "Maine Coon",
        origin: "United States",
        size_class: "large",
        life_span_years: 13,
        temperament: "gentle, playful, adaptable",
        description: "One of the largest domestic cats, with a shaggy coat and an easygoing nature.",
    },
    SeedEntry {
        species: "cat",
        breed: "British Shorthair",
        origin: "United Kingdom",
        size_class: "medium",
        life_span_years: 14,
        temperament: "calm, undemanding, loyal",
        description: "A sturdy, plush-coated cat happy to keep its own company during the day.",
    },
    SeedEntry {
        species: "cat",
        breed: "Ragdoll",
        origin: "United States",
        size_class: "large",
        life_span_years: 14,
        temperament: "docile, placid, affectionate",
        description: "Known for going limp when picked up. Best kept indoors.",
    },
    SeedEntry {
        species: "rabbit",
        breed: "Holland Lop",
        origin: "Netherlands",
        size_class: "small",
        life_span_years: 9,
        temperament: "sweet, sociable, lively",
        description: "A dwarf lop-eared rabbit that does best with a bonded partner and room to run.",
    },
    SeedEntry {
        species: "rabbit",
        breed: "Flemish Giant",
        origin: "Belgium",
        size_class: "large",
        life_span_years: 8,
        temperament: "docile, tolerant, calm",
        description: "A very large, gentle rabbit often described as dog-like in temperament.",
    },
    SeedEntry {
        species: "bird",
        breed: "Budgerigar",
        origin: "Australia",
        size_class: "small",
        life_span_years: 8,
        temperament: "social, playful, vocal",
        description: "A small parakeet that can learn to mimic speech. Happiest in pairs.",
    },
];

/// Dictionary service
pub struct DictionaryService {
    repo: Arc<dyn DictionaryRepository>,
    cache: Arc<MemoryCache>,
}

impl DictionaryService {
    pub fn new(repo: Arc<dyn DictionaryRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Seed the built-in catalog when the table is empty.
    ///
    /// Returns the number of entries inserted (0 when already populated).
    pub async fn seed_defaults(&self) -> Result<usize> {
        let existing = self.repo.count_all().await?;
        if existing > 0 {
            return Ok(0);
        }

        for seed in SEED_ENTRIES {
            let entry = DictionaryEntry {
                id: 0,
                species: seed.species.to_string(),
                breed: seed.breed.to_string(),
                origin: Some(seed.origin.to_string()),
                size_class: Some(seed.size_class.to_string()),
                life_span_years: Some(seed.life_span_years),
                temperament: Some(seed.temperament.to_string()),
                description: seed.description.to_string(),
                image_url: None,
            };
            self.repo
                .insert(&entry)
                .await
                .with_context(|| format!("Failed to seed dictionary entry {}", seed.breed))?;
        }

        self.cache.delete_pattern("dictionary:*").await?;

        Ok(SEED_ENTRIES.len())
    }

    /// Filtered, sorted, paginated catalog browse. Results are cached.
    pub async fn browse(
        &self,
        filter: &DictionaryFilter,
        params: &ListParams,
    ) -> Result<PagedResult<DictionaryEntry>> {
        let key = list_cache_key(filter, params);

        if let Some(cached) = self.cache.get::<PagedResult<DictionaryEntry>>(&key).await? {
            return Ok(cached);
        }

        let items = self
            .repo
            .list(filter, params.offset(), params.limit())
            .await?;
        let total = self.repo.count(filter).await?;
        let result = PagedResult::new(items, total, params);

        self.cache.set(&key, &result, CACHE_TTL).await?;

        Ok(result)
    }

    /// Fetch one catalog entry
    pub async fn get(&self, id: i64) -> Result<Option<DictionaryEntry>> {
        self.repo.get_by_id(id).await
    }

    /// Entry counts grouped by species. Cached.
    pub async fn stats(&self) -> Result<Vec<SpeciesCount>> {
        const KEY: &str = "dictionary:stats";

        if let Some(cached) = self.cache.get::<Vec<SpeciesCount>>(KEY).await? {
            return Ok(cached);
        }

        let stats = self.repo.stats_by_species().await?;
        self.cache.set(KEY, &stats, CACHE_TTL).await?;

        Ok(stats)
    }
}

fn list_cache_key(filter: &DictionaryFilter, params: &ListParams) -> String {
    format!(
        "dictionary:list:{}:{}:{}:{}:{}:{}",
        filter.species.as_deref().unwrap_or("-"),
        filter.size_class.as_deref().unwrap_or("-"),
        filter.query.as_deref().unwrap_or("-"),
        filter.sort_by_life_span,
        params.page,
        params.per_page,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxDictionaryRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> DictionaryService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        DictionaryService::new(
            SqlxDictionaryRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
        )
    }

    #[tokio::test]
    async fn test_seed_defaults_once() {
        let service = setup().await;

        let inserted = service.seed_defaults().await.expect("Failed to seed");
        assert_eq!(inserted, SEED_ENTRIES.len());

        // Second run is a no-op
        let inserted = service.seed_defaults().await.expect("Failed to seed");
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn test_browse_with_species_filter() {
        let service = setup().await;
        service.seed_defaults().await.unwrap();

        let filter = DictionaryFilter {
            species: Some("cat".to_string()),
            ..Default::default()
        };
        let page = service
            .browse(&filter, &ListParams::default())
            .await
            .expect("Failed to browse");

        assert_eq!(page.total, 4);
        assert!(page.items.iter().all(|e| e.species == "cat"));
    }

    #[tokio::test]
    async fn test_browse_served_from_cache() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxDictionaryRepository::boxed(pool);
        let service = DictionaryService::new(repo.clone(), Arc::new(MemoryCache::new()));
        service.seed_defaults().await.unwrap();

        let filter = DictionaryFilter::default();
        let params = ListParams::default();

        let first = service.browse(&filter, &params).await.unwrap();

        // Insert behind the cache's back; the cached page wins until expiry
        repo.insert(&DictionaryEntry {
            id: 0,
            species: "dog".to_string(),
            breed: "Dalmatian".to_string(),
            origin: None,
            size_class: Some("large".to_string()),
            life_span_years: Some(12),
            temperament: None,
            description: "Spotted coach dog.".to_string(),
            image_url: None,
        })
        .await
        .unwrap();

        let second = service.browse(&filter, &params).await.unwrap();
        assert_eq!(first.total, second.total);
    }

    #[tokio::test]
    async fn test_stats_by_species() {
        let service = setup().await;
        service.seed_defaults().await.unwrap();

        let stats = service.stats().await.expect("Failed to read stats");
        assert_eq!(stats[0].species, "dog");
        assert_eq!(stats[0].count, 5);

        let total: i64 = stats.iter().map(|s| s.count).sum();
        assert_eq!(total, SEED_ENTRIES.len() as i64);
    }

    #[tokio::test]
    async fn test_get_entry() {
        let service = setup().await;
        service.seed_defaults().await.unwrap();

        let page = service
            .browse(&DictionaryFilter::default(), &ListParams::new(1, 1))
            .await
            .unwrap();
        let id = page.items[0].id;

        let entry = service.get(id).await.unwrap();
        assert!(entry.is_some());

        let missing = service.get(9999).await.unwrap();
        assert!(missing.is_none());
    }
}
