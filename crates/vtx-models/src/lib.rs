//! Shared data models for the vtx transcode service.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and the job status state machine
//! - `store://bucket/key` object references
//! - The fixed encoding profile
//! - Upload validation policy
//! - Wire DTOs shared by the edge API and its clients

pub mod encoding;
pub mod job;
pub mod store_uri;
pub mod upload;
pub mod wake;
pub mod wire;

// Re-export common types
pub use encoding::EncodingProfile;
pub use job::{Job, JobId, JobInvariantError, JobStatus, NewJob};
pub use store_uri::{StoreUri, StoreUriError, STORE_SCHEME};
pub use upload::{
    result_object_key, upload_object_key, AcceptedUpload, UploadPolicy, UploadRejection, DEFAULT_ALLOWED_TYPES,
    DEFAULT_MAX_UPLOAD_BYTES,
};
pub use wake::{WakeStatus, WorkerStatus};
pub use wire::{
    CreateJobRequest, ErrorBody, SignedUrlResponse, UploadUrlRequest, UploadUrlResponse,
    WakeResponse,
};
