// trk-common - Shared wire and domain types for the trip tracking server
//
// This crate defines the envelope, error codes, records and command payloads
// shared by the server and its clients

pub mod error;
pub mod model;
pub mod payload;
pub mod protocol;

// Re-export for convenience
pub use error::*;
pub use model::*;
pub use payload::*;
pub use protocol::*;
