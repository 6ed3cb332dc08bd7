pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{DocumentStore, Entry, StoreError, StoreResult};
pub use store::{FEEDBACKS, NOTIFICATIONS, PREDEFINED_TRIPS, TRIP_PLANS, USERS};
