//! Adoption application model
//!
//! An application captures one user's interest in one pet and its review
//! status. Status moves through a small state machine driven entirely by the
//! shelter that owns the referenced pet:
//!
//! ```text
//! Pending -> Contacted -> Approved
//!    |           |
//!    |           +-----> Rejected
//!    +-> Approved / Rejected
//! ```
//!
//! Approved and Rejected are terminal. There are no automatic transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Adoption application entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptionApplication {
    /// Unique identifier
    pub id: i64,
    /// Referenced pet
    pub pet_id: i64,
    /// Applying user
    pub applicant_id: i64,
    /// Free-text message to the shelter
    pub message: Option<String>,
    /// Review status
    pub status: ApplicationStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Application review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Submitted, not yet reviewed
    Pending,
    /// Shelter has reached out to the applicant
    Contacted,
    /// Application accepted (terminal)
    Approved,
    /// Application declined (terminal)
    Rejected,
}

impl ApplicationStatus {
    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Contacted) | (Pending, Approved) | (Pending, Rejected)
                | (Contacted, Approved)
                | (Contacted, Rejected)
        )
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "pending"),
            ApplicationStatus::Contacted => write!(f, "contacted"),
            ApplicationStatus::Approved => write!(f, "approved"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "contacted" => Ok(ApplicationStatus::Contacted),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid application status: {}", s)),
        }
    }
}
