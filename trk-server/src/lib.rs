//! # Trip Tracking Server
//!
//! Line-delimited JSON command server for the trip tracking client.
//!
//! ```text
//! accept -> Session -> FrameAccumulator -> Router -> handlers -> encoder -> socket
//! ```

pub mod command;
pub mod config;
pub mod encoder;
pub mod frame;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod seed;
pub mod server;
pub mod service;
pub mod session;

pub use config::ServerConfig;
pub use server::{Server, ServerError, ServerHandle};
pub use service::TrackingService;
