//! Pet dictionary model
//!
//! Static reference catalog (breed encyclopedia). No ownership, read-mostly;
//! entries are seeded at startup and served with filter/sort/paginate plus a
//! per-species statistics view.

use serde::{Deserialize, Serialize};

/// Breed encyclopedia entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: i64,
    /// Species (e.g. "dog", "cat")
    pub species: String,
    /// Breed name, unique within a species
    pub breed: String,
    /// Geographic origin
    pub origin: Option<String>,
    /// Typical size class
    pub size_class: Option<String>,
    /// Typical life span in years
    pub life_span_years: Option<i64>,
    /// Temperament keywords
    pub temperament: Option<String>,
    pub description: String,
    pub image_url: Option<String>,
}

/// Filter surface for catalog browsing
#[derive(Debug, Clone, Default)]
pub struct DictionaryFilter {
    pub species: Option<String>,
    pub size_class: Option<String>,
    /// Free-text match over breed and description
    pub query: Option<String>,
    /// Sort by breed name when false, by life span when true
    pub sort_by_life_span: bool,
}

/// Entry count for one species, used by the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub species: String,
    pub count: i64,
}
