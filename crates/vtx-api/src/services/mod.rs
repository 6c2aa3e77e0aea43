//! Business logic services.

mod job;

pub use job::JobService;
