//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Cached soil summaries (keyed by cache key)
    pub const SOIL_CACHE: &str = "soil_cache";
}
