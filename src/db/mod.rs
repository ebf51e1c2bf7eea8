//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreProfiles;

use crate::error::AppError;
use crate::models::Profile;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Abstract profile store.
///
/// The session reconciler is written against this trait so its state
/// machine can be exercised offline; `FirestoreProfiles` is the production
/// implementation.
///
/// All mutations of the `my_list` mirror re-fetch the record immediately
/// before writing. There are no transactions: concurrent writers are
/// last-writer-wins.
#[allow(async_fn_in_trait)]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by auth UID. `Ok(None)` means no record exists.
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError>;

    /// Create (or overwrite) the profile document for `profile.uid`.
    async fn create(&self, profile: &Profile) -> Result<(), AppError>;

    /// Replace the stored profile wholesale (profile-edit save).
    async fn update(&self, profile: &Profile) -> Result<(), AppError>;

    /// Record a login time on an existing profile.
    async fn set_last_login(&self, uid: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Add a catalog item ID to the durable my-list mirror.
    ///
    /// No-op if the ID is already present.
    async fn add_to_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError>;

    /// Remove a catalog item ID from the durable my-list mirror.
    async fn remove_from_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError>;
}
