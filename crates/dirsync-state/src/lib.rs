//! Snapshot repositories for dirsync.
//!
//! Implements the driver's
//! [`StateRepository`](dirsync_core::traits::StateRepository) port twice:
//! against S3 object storage (the deployed shape) and against a local JSON
//! file. Both store the same versioned document and replace it atomically.

mod codec;
mod error;
mod file;
mod s3;

pub use error::{StateError, StateResult};
pub use file::FileStateRepository;
pub use s3::S3StateRepository;
