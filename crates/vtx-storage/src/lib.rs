//! S3-compatible object store client.
//!
//! This crate provides:
//! - The `ObjectStore` capability used by the worker and the edge API
//! - `R2Client`, an aws-sdk-s3 implementation (Cloudflare R2 or any S3 endpoint)
//! - `MemoryObjectStore` for tests and local runs
//! - Presigned GET/PUT URL generation

pub mod client;
pub mod error;
pub mod memory;
pub mod object_store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectStore, RESULT_URL_TTL, UPLOAD_URL_TTL};
