// --- File: crates/meetsync_db/src/lib.rs ---
//! SQLite persistence for Meetsync: the connection pool client, row models,
//! per-aggregate repositories, and the named-lock registry.

pub mod client;
pub mod error;
pub mod locks;
pub mod models;
pub mod repositories;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use locks::{NamedLockGuard, NamedLocks};
pub use models::*;
pub use repositories::{
    AvailabilityRepository, LeadRepository, MeetingRepository, StaffRepository,
    WebhookJobRepository,
};
