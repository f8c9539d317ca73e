//! Adapter contracts the sync driver is polymorphic over.
//!
//! Three capability sets, each plugged in at construction time: the upstream
//! identity provider (read-only), the downstream SCIM target (read plus
//! mutations), and the snapshot store. Concurrency, paging, and retries live
//! behind these traits; the driver only sees composed result values.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::model::{
    GroupsMembersResult, GroupsResult, MembersResult, State, UsersResult,
};

/// Upstream directory: the authoritative source of groups and users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// List the groups selected by `filter`, keeping only the first
    /// occurrence of each group name; later duplicates are dropped with a
    /// warning.
    async fn get_groups(&self, filter: &[String]) -> ProviderResult<GroupsResult>;

    /// List users selected by `filter`, with primary-email normalization
    /// applied.
    async fn get_users(&self, filter: &[String]) -> ProviderResult<UsersResult>;

    /// Direct, flattened member list of one group. Transitive human members
    /// are included; entries that are themselves groups are discarded.
    async fn get_group_members(&self, group_id: &str) -> ProviderResult<MembersResult>;

    /// The flat user population referenced by at least one synced group,
    /// deduplicated by email.
    async fn get_users_by_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<UsersResult>;

    /// Member lists for every input group. A `GroupMembers` entry is emitted
    /// even for an empty group, so the diff kernel can see it was observed.
    async fn get_groups_members(
        &self,
        groups: &GroupsResult,
    ) -> ProviderResult<GroupsMembersResult>;
}

/// Downstream SCIM target: full enumeration of the tenant plus mutations.
///
/// Every mutation returns the authoritative result with server-issued
/// `scim_id`s populated, and must be idempotent over the partition identity
/// (natural keys) — re-issuing after a partial failure never double-applies.
#[async_trait]
pub trait ScimProvider: Send + Sync {
    async fn get_users(&self) -> ProviderResult<UsersResult>;

    async fn get_groups(&self) -> ProviderResult<GroupsResult>;

    async fn get_groups_members(&self) -> ProviderResult<GroupsMembersResult>;

    async fn create_users(&self, users: &UsersResult) -> ProviderResult<UsersResult>;

    async fn update_users(&self, users: &UsersResult) -> ProviderResult<UsersResult>;

    async fn delete_users(&self, users: &UsersResult) -> ProviderResult<()>;

    async fn create_groups(&self, groups: &GroupsResult) -> ProviderResult<GroupsResult>;

    async fn delete_groups(&self, groups: &GroupsResult) -> ProviderResult<()>;

    async fn create_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<GroupsMembersResult>;

    async fn delete_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<()>;
}

/// Store for the last successfully reconciled snapshot.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load the previous snapshot, or `None` when no snapshot exists yet.
    async fn get_state(&self) -> ProviderResult<Option<State>>;

    /// Atomically replace the snapshot; a partial write must never be
    /// observable.
    async fn set_state(&self, state: &State) -> ProviderResult<()>;
}
