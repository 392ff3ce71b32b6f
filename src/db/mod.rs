//! Database layer
//!
//! SQLite persistence for the PawHaven service. The layer is split into:
//! - `pool` - connection pool creation (file-backed or in-memory)
//! - `migrations` - embedded, versioned schema migrations
//! - `repositories` - one trait + sqlx implementation per aggregate
//!
//! # Usage
//!
//! ```ignore
//! use pawhaven::config::DatabaseConfig;
//! use pawhaven::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DbPool};
