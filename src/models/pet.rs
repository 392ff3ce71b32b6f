//! Pet listing model
//!
//! This module provides:
//! - `Pet` entity representing a published listing
//! - `ListingType`, `PetGender`, `PetSize` enums
//! - Input types for creating and updating listings
//! - `PetFilter` describing the public browse query surface
//! - Pagination types shared by list endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pet listing entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    /// Unique identifier
    pub id: i64,
    /// Pet name
    pub name: String,
    /// Species (e.g. "dog", "cat")
    pub species: String,
    /// Breed
    pub breed: String,
    /// Gender
    pub gender: PetGender,
    /// Size class
    pub size: PetSize,
    /// Age in months
    pub age_months: Option<i64>,
    /// Listing description
    pub description: String,
    /// Image URLs
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Listing disposition: adoption or sale
    pub listing_type: ListingType,
    /// Asking price, present only for sale listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Price currency, present only for sale listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Whether the price is negotiable (sale listings only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_negotiable: Option<bool>,
    /// Whether the pet has found a home
    pub is_adopted: bool,
    /// Owning shelter user ID
    pub posted_by: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Pet {
    /// Whether this listing carries pricing fields
    pub fn is_sale(&self) -> bool {
        self.listing_type == ListingType::Sale
    }
}

/// Listing disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    /// Free adoption listing
    Adoption,
    /// Sale listing with pricing
    Sale,
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingType::Adoption => write!(f, "adoption"),
            ListingType::Sale => write!(f, "sale"),
        }
    }
}

impl FromStr for ListingType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adoption" => Ok(ListingType::Adoption),
            "sale" => Ok(ListingType::Sale),
            _ => Err(anyhow::anyhow!("Invalid listing type: {}", s)),
        }
    }
}

/// Pet gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetGender {
    Male,
    Female,
}

impl fmt::Display for PetGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetGender::Male => write!(f, "male"),
            PetGender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for PetGender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(PetGender::Male),
            "female" => Ok(PetGender::Female),
            _ => Err(anyhow::anyhow!("Invalid pet gender: {}", s)),
        }
    }
}

/// Pet size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl fmt::Display for PetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetSize::Small => write!(f, "small"),
            PetSize::Medium => write!(f, "medium"),
            PetSize::Large => write!(f, "large"),
        }
    }
}

impl FromStr for PetSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(PetSize::Small),
            "medium" => Ok(PetSize::Medium),
            "large" => Ok(PetSize::Large),
            _ => Err(anyhow::anyhow!("Invalid pet size: {}", s)),
        }
    }
}

/// Input for creating a new pet listing
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePetInput {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub gender: PetGender,
    pub size: PetSize,
    pub age_months: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub listing_type: ListingType,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub is_negotiable: Option<bool>,
}

/// Input for updating an existing pet listing
///
/// Every field is optional; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePetInput {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<PetGender>,
    pub size: Option<PetSize>,
    pub age_months: Option<i64>,
    pub description: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub is_negotiable: Option<bool>,
}

/// Sort key for the public listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetSortKey {
    #[default]
    CreatedAt,
    Price,
    Name,
}

impl PetSortKey {
    /// Column name used in ORDER BY clauses
    pub fn column(&self) -> &'static str {
        match self {
            PetSortKey::CreatedAt => "created_at",
            PetSortKey::Price => "price",
            PetSortKey::Name => "name",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Filter predicates for the public pet listing.
///
/// Translated into a single SQL query by the repository; this is a flat
/// predicate set, not a query language.
#[derive(Debug, Clone, Default)]
pub struct PetFilter {
    pub species: Option<String>,
    pub gender: Option<PetGender>,
    pub size: Option<PetSize>,
    pub listing_type: Option<ListingType>,
    /// Free-text match over name, breed and description
    pub query: Option<String>,
    /// Minimum price (sale listings)
    pub min_price: Option<f64>,
    /// Maximum price (sale listings)
    pub max_price: Option<f64>,
    /// Include pets already marked adopted
    pub include_adopted: bool,
    pub sort: PetSortKey,
    pub direction: SortDirection,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
