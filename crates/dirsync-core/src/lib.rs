//! # Reconciliation engine
//!
//! Core of dirsync: projects the user/group membership state of an upstream
//! identity provider onto a downstream SCIM target, optionally keeping a
//! snapshot of the last reconciled view between runs.
//!
//! - [`model`] — entities, result containers, order-independent hashing
//! - [`diff`] — pure partitioning of provider state against target state
//! - [`merge`] — flattening result sets into the next snapshot
//! - [`traits`] — the three adapter ports the driver is polymorphic over
//! - [`sync`] — the two-mode driver (first run / incremental)
//! - [`error`] — contract, transport, and driver error types
//!
//! Adapters for Google Workspace, SCIM targets, and S3 live in the sibling
//! crates `dirsync-gws`, `dirsync-scim`, and `dirsync-state`.

pub mod diff;
pub mod error;
pub mod merge;
pub mod model;
pub mod sync;
pub mod traits;

pub use error::{DiffError, ProviderError, ProviderResult, SyncError, SyncPhase, SyncResult};
pub use sync::{SyncReport, SyncService};
pub use traits::{IdentityProvider, ScimProvider, StateRepository};

// Re-export for adapter implementors.
pub use async_trait::async_trait;
