//! Repository layer
//!
//! One repository per aggregate, each defined as an `async_trait` trait with
//! a sqlx-backed implementation. Services depend on the traits so tests can
//! run against the in-memory pool.

pub mod application;
pub mod dictionary;
pub mod notification;
pub mod pet;
pub mod post;
pub mod session;
pub mod user;

pub use application::{ApplicationRepository, SqlxApplicationRepository};
pub use dictionary::{DictionaryRepository, SqlxDictionaryRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use pet::{PetRepository, SqlxPetRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
