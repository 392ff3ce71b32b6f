//! Domain models
//!
//! This module defines all entities used by the PawHaven service.

pub mod application;
pub mod dictionary;
pub mod notification;
pub mod pet;
pub mod post;
pub mod session;
pub mod user;

pub use application::{AdoptionApplication, ApplicationStatus};
pub use dictionary::{DictionaryEntry, DictionaryFilter, SpeciesCount};
pub use notification::{Notification, NotificationKind};
pub use pet::{
    CreatePetInput, ListParams, ListingType, PagedResult, Pet, PetFilter, PetGender, PetSize,
    PetSortKey, SortDirection, UpdatePetInput,
};
pub use post::{
    Comment, CommentWithMeta, CreateCommentInput, CreatePostInput, Like, LikeTargetType, Post,
    UpdatePostInput,
};
pub use session::Session;
pub use user::{User, UserRole};
