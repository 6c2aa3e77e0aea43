//! Request handlers.

pub mod health;
pub mod jobs;
pub mod upload;
pub mod wake;

pub use health::*;
pub use jobs::*;
pub use upload::*;
pub use wake::*;
