//! User model
//!
//! This module defines the User entity and related types. Users come in two
//! flavors: adopters, who browse listings and apply for pets, and shelters,
//! who publish listings and review applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
///
/// Accounts authenticate either with a password (argon2 hash stored) or via
/// an external identity provider, in which case `password_hash` is absent and
/// `provider` records where the identity came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2), absent for external-identity accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// External identity provider marker (e.g. "google")
    pub provider: Option<String>,
    /// Account role
    pub role: UserRole,
    /// Contact phone number
    pub phone: Option<String>,
    /// City for local adoption matching
    pub city: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new password-based User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash: Some(password_hash),
            provider: None,
            role,
            phone: None,
            city: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new external-identity User with no stored credential.
    pub fn external(username: String, email: String, provider: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            password_hash: None,
            provider: Some(provider),
            role: UserRole::Adopter,
            phone: None,
            city: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is a shelter
    pub fn is_shelter(&self) -> bool {
        self.role == UserRole::Shelter
    }
}

/// Account role.
///
/// Shelters can publish and manage pet listings and act on adoption
/// applications; adopters can apply for pets. Both participate in the forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user browsing and applying for pets
    Adopter,
    /// Shelter managing listings and applications
    Shelter,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Adopter
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Adopter => write!(f, "adopter"),
            UserRole::Shelter => write!(f, "shelter"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adopter" => Ok(UserRole::Adopter),
            "shelter" => Ok(UserRole::Shelter),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}
