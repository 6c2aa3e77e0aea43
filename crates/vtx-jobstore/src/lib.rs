//! Job table access.
//!
//! This crate provides:
//! - The `JobStore` capability shared by the worker and the edge API
//! - `PostgrestClient`, a REST client for a Supabase/PostgREST `jobs` table
//! - `MemoryJobStore` for tests and local runs
//! - Conditional status updates used as the atomic claim primitive

pub mod error;
pub mod memory;
pub mod metrics;
pub mod postgrest;
pub mod store;

pub use error::{JobStoreError, JobStoreResult};
pub use memory::MemoryJobStore;
pub use postgrest::{PostgrestClient, PostgrestConfig};
pub use store::{JobStore, JobUpdate};
