//! SCIM 2.0 target adapter for dirsync.
//!
//! Implements the driver's [`ScimProvider`](dirsync_core::traits::ScimProvider)
//! port over a bearer-authenticated HTTP client: full tenant enumeration with
//! `startIndex` pagination, and create/update/delete mutations that stay
//! idempotent over natural keys (409 on create adopts the existing resource,
//! 404 on delete is already-done).

mod client;
mod error;
mod provider;
mod wire;

pub use client::ScimClient;
pub use error::{ScimError, ScimResult};
pub use provider::ScimTargetProvider;
pub use wire::{
    ListResponse, PatchOperation, PatchRequest, ScimEmail, ScimGroup, ScimGroupMember, ScimName,
    ScimUser,
};
