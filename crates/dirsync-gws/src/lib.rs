//! Google Workspace directory adapter for dirsync.
//!
//! Implements the driver's
//! [`IdentityProvider`](dirsync_core::traits::IdentityProvider) port over the
//! Admin SDK Directory API: service-account authentication with domain-wide
//! delegation, paged listing, transitive group expansion with nested-group
//! entries dropped, and duplicate-name suppression.

mod auth;
mod client;
mod error;
mod provider;
mod wire;

pub use auth::{ServiceAccountKey, TokenProvider, TokenSource, DIRECTORY_SCOPES};
pub use client::{DirectoryApi, DirectoryClient};
pub use error::{GwsError, GwsResult};
pub use provider::GwsIdentityProvider;
pub use wire::{GwsGroup, GwsMember, GwsUser, GwsUserName};
