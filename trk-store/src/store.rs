//! # Document Store Interface
//!
//! ## Design Principles
//!
//! 1. **Strategy Pattern**: Abstract the store behind a trait so the remote
//!    document service and the in-process store are swapped without touching
//!    the handlers.
//! 2. **Schema-Free Records**: Records are JSON values; typing happens in the
//!    caller, which knows what each collection holds.
//! 3. **Object Safety**: `async_trait` keeps the trait usable as
//!    `Arc<dyn DocumentStore>`, so the store is an explicit value owned by the
//!    server context rather than ambient global state.
//! 4. **No Transactions**: Every call touches one record or one collection.
//!    Multi-record sequences are the caller's problem.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Collection holding registered users, keyed by user id.
pub const USERS: &str = "users";
/// Collection holding routes, keyed by trip id.
pub const PREDEFINED_TRIPS: &str = "predefined_trips";
/// Collection holding per-trip plan overrides, keyed by generated id.
pub const TRIP_PLANS: &str = "trip_plans";
/// Collection holding notifications, keyed by generated id.
pub const NOTIFICATIONS: &str = "notifications";
/// Collection holding feedback, keyed by feedback id.
pub const FEEDBACKS: &str = "feedbacks";

/// Result type used by store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing service could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A record could not be converted to or from its typed form.
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub record: Value,
}

/// Strategy pattern: the key/value surface the protocol layer relies on.
///
/// Implementations may fail on every call; callers decide whether a failure
/// becomes an empty result or a failure envelope.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every record in `collection`, ordered by key.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Entry>>;

    /// Returns the record stored under `id`, or `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Inserts or replaces the record stored under `id`.
    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()>;

    /// Inserts `record` under a freshly generated key and returns that key.
    ///
    /// Generated keys sort in insertion order.
    async fn append(&self, collection: &str, record: Value) -> StoreResult<String>;
}
