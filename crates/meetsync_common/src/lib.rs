// --- File: crates/meetsync_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{config_error, internal_error, HttpStatusCode, MeetsyncError};

// Re-export HTTP utilities for easier access
pub use http::create_client;
