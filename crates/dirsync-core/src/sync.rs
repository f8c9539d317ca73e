//! Sync driver: orchestrates one reconciliation run.
//!
//! Two modes, selected by the presence of a prior snapshot. A first run
//! diffs the provider against the live SCIM target; an incremental run
//! diffs against the snapshot (state is authoritative) and short-circuits
//! entirely when the provider hashes match the snapshot. Mutations are
//! applied in a strict dependency-safe order and the snapshot is written
//! only after every mutation of the run has been confirmed.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diff::{
    groups_operations, members_operations, users_operations, GroupsDiff, MembersDiff, UsersDiff,
};
use crate::error::{ProviderResult, SyncError, SyncPhase, SyncResult};
use crate::merge::{merge_groups_members_result, merge_groups_result, merge_users_result};
use crate::model::{GroupsMembersResult, GroupsResult, State, UsersResult};
use crate::traits::{IdentityProvider, ScimProvider, StateRepository};

/// Per-partition counts of one reconciliation run, for the summary record
/// and the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub users_created: usize,
    pub users_updated: usize,
    pub users_deleted: usize,
    pub users_equal: usize,
    pub groups_created: usize,
    pub groups_changed: usize,
    pub groups_deleted: usize,
    pub groups_equal: usize,
    pub memberships_created: usize,
    pub memberships_deleted: usize,
}

impl SyncReport {
    fn from_diffs(groups: &GroupsDiff, users: &UsersDiff, members: &MembersDiff) -> Self {
        Self {
            users_created: users.create.items,
            users_updated: users.update.items,
            users_deleted: users.delete.items,
            users_equal: users.equal.items,
            groups_created: groups.create.items,
            groups_changed: groups.update.items,
            groups_deleted: groups.delete.items,
            groups_equal: groups.equal.items,
            memberships_created: members
                .create
                .resources
                .iter()
                .map(|gm| gm.items)
                .sum(),
            memberships_deleted: members
                .delete
                .resources
                .iter()
                .map(|gm| gm.items)
                .sum(),
        }
    }

    /// True when the run issued no mutation.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.users_created == 0
            && self.users_updated == 0
            && self.users_deleted == 0
            && self.groups_created == 0
            && self.groups_deleted == 0
            && self.memberships_created == 0
            && self.memberships_deleted == 0
    }
}

/// The merged post-mutation view of one run, destined for the snapshot.
struct SyncOutcome {
    groups: GroupsResult,
    users: UsersResult,
    groups_members: GroupsMembersResult,
    report: SyncReport,
}

/// One-shot reconciliation driver over the three adapter ports.
pub struct SyncService {
    provider: Arc<dyn IdentityProvider>,
    scim: Arc<dyn ScimProvider>,
    state: Option<Arc<dyn StateRepository>>,
    cancel: CancellationToken,
    code_version: String,
}

impl SyncService {
    pub fn new(provider: Arc<dyn IdentityProvider>, scim: Arc<dyn ScimProvider>) -> Self {
        Self {
            provider,
            scim,
            state: None,
            cancel: CancellationToken::new(),
            code_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Enable snapshot persistence. Without a repository every run is a
    /// first sync against the live target.
    #[must_use]
    pub fn with_state(mut self, repository: Arc<dyn StateRepository>) -> Self {
        self.state = Some(repository);
        self
    }

    /// Thread an external cancellation signal through every adapter call.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run one reconciliation of the groups selected by `filter` and their
    /// transitive members.
    pub async fn sync_groups_and_users(&self, filter: &[String]) -> SyncResult<SyncReport> {
        let prior = match &self.state {
            Some(repository) => {
                self.guard(SyncPhase::LoadState, repository.get_state())
                    .await?
            }
            None => None,
        };

        let report = match prior {
            Some(state) => self.incremental_sync(filter, state).await?,
            None => self.first_sync(filter).await?,
        };

        info!(
            users_created = report.users_created,
            users_updated = report.users_updated,
            users_deleted = report.users_deleted,
            groups_created = report.groups_created,
            groups_deleted = report.groups_deleted,
            memberships_created = report.memberships_created,
            memberships_deleted = report.memberships_deleted,
            "reconciliation complete"
        );
        Ok(report)
    }

    /// First run: no snapshot, so the live SCIM target is the comparison
    /// baseline.
    async fn first_sync(&self, filter: &[String]) -> SyncResult<SyncReport> {
        info!("no previous state, reconciling against the live scim target");

        let idp_groups = self
            .guard(SyncPhase::FetchProvider, self.provider.get_groups(filter))
            .await?;
        let idp_groups_members = self
            .guard(
                SyncPhase::FetchProvider,
                self.provider.get_groups_members(&idp_groups),
            )
            .await?;
        let idp_users = self
            .guard(
                SyncPhase::FetchProvider,
                self.provider.get_users_by_groups_members(&idp_groups_members),
            )
            .await?;
        debug!(
            groups = idp_groups.items,
            users = idp_users.items,
            "identity provider state fetched"
        );

        let scim_groups = self
            .guard(SyncPhase::FetchTarget, self.scim.get_groups())
            .await?;
        let scim_users = self
            .guard(SyncPhase::FetchTarget, self.scim.get_users())
            .await?;
        let scim_groups_members = self
            .guard(SyncPhase::FetchTarget, self.scim.get_groups_members())
            .await?;
        debug!(
            groups = scim_groups.items,
            users = scim_users.items,
            "scim target state fetched"
        );

        let groups_diff = groups_operations(Some(&idp_groups), Some(&scim_groups))?;
        let users_diff = users_operations(Some(&idp_users), Some(&scim_users))?;
        let members_diff =
            members_operations(Some(&idp_groups_members), Some(&scim_groups_members))?;

        let outcome = self.apply(&groups_diff, &users_diff, &members_diff).await?;
        self.persist(&outcome).await?;
        Ok(outcome.report)
    }

    /// Incremental run: the snapshot is authoritative for the target side.
    async fn incremental_sync(&self, filter: &[String], prior: State) -> SyncResult<SyncReport> {
        info!(last_sync = %prior.last_sync, "previous state found, reconciling against it");

        let idp_groups = self
            .guard(SyncPhase::FetchProvider, self.provider.get_groups(filter))
            .await?;
        let idp_groups_members = self
            .guard(
                SyncPhase::FetchProvider,
                self.provider.get_groups_members(&idp_groups),
            )
            .await?;
        let idp_users = self
            .guard(
                SyncPhase::FetchProvider,
                self.provider.get_users_by_groups_members(&idp_groups_members),
            )
            .await?;

        let unchanged = idp_groups.hash_code == prior.resources.groups.hash_code
            && idp_users.hash_code == prior.resources.users.hash_code
            && idp_groups_members.hash_code == prior.resources.groups_members.hash_code;

        if unchanged {
            info!("provider state unchanged since last sync, nothing to reconcile");
            if let Some(repository) = &self.state {
                let mut refreshed = prior;
                refreshed.last_sync = Utc::now();
                self.guard(SyncPhase::SaveState, repository.set_state(&refreshed))
                    .await?;
            }
            return Ok(SyncReport::default());
        }

        let groups_diff = groups_operations(Some(&idp_groups), Some(&prior.resources.groups))?;
        let users_diff = users_operations(Some(&idp_users), Some(&prior.resources.users))?;
        let members_diff = members_operations(
            Some(&idp_groups_members),
            Some(&prior.resources.groups_members),
        )?;

        let outcome = self.apply(&groups_diff, &users_diff, &members_diff).await?;
        self.persist(&outcome).await?;
        Ok(outcome.report)
    }

    /// Apply the three diffs in dependency order: membership rows and groups
    /// and users are torn down before anything is built, and users exist in
    /// the target before any membership row references them. Each phase is
    /// fully confirmed before the next begins.
    async fn apply(
        &self,
        groups: &GroupsDiff,
        users: &UsersDiff,
        members: &MembersDiff,
    ) -> SyncResult<SyncOutcome> {
        let report = SyncReport::from_diffs(groups, users, members);

        if members.delete.items > 0 {
            info!(groups = members.delete.items, "deleting membership rows");
            self.guard(
                SyncPhase::DeleteGroupsMembers,
                self.scim.delete_groups_members(&members.delete),
            )
            .await?;
        }

        if groups.delete.items > 0 {
            info!(groups = groups.delete.items, "deleting groups");
            self.guard(SyncPhase::DeleteGroups, self.scim.delete_groups(&groups.delete))
                .await?;
        }

        if users.delete.items > 0 {
            info!(users = users.delete.items, "deleting users");
            self.guard(SyncPhase::DeleteUsers, self.scim.delete_users(&users.delete))
                .await?;
        }

        let users_created = if users.create.items > 0 {
            info!(users = users.create.items, "creating users");
            self.guard(SyncPhase::CreateUsers, self.scim.create_users(&users.create))
                .await?
        } else {
            UsersResult::new(Vec::new())
        };

        let users_updated = if users.update.items > 0 {
            info!(users = users.update.items, "updating users");
            self.guard(SyncPhase::UpdateUsers, self.scim.update_users(&users.update))
                .await?
        } else {
            UsersResult::new(Vec::new())
        };

        let groups_created = if groups.create.items > 0 {
            info!(groups = groups.create.items, "creating groups");
            self.guard(SyncPhase::CreateGroups, self.scim.create_groups(&groups.create))
                .await?
        } else {
            GroupsResult::new(Vec::new())
        };

        // Group attributes are not mutable on the target; a changed group is
        // carried forward in state only.
        for group in &groups.update.resources {
            warn!(
                group = %group.name,
                "group attributes changed upstream but scim groups are not updatable, keeping the change in state only"
            );
        }

        let members_created = if members.create.items > 0 {
            info!(groups = members.create.items, "creating membership rows");
            self.guard(
                SyncPhase::CreateGroupsMembers,
                self.scim.create_groups_members(&members.create),
            )
            .await?
        } else {
            GroupsMembersResult::new(Vec::new())
        };

        Ok(SyncOutcome {
            groups: merge_groups_result(&[&groups_created, &groups.update, &groups.equal]),
            users: merge_users_result(&[&users_created, &users_updated, &users.equal]),
            groups_members: merge_groups_members_result(&[&members_created, &members.equal]),
            report,
        })
    }

    /// Write the merged post-mutation view as the next snapshot.
    async fn persist(&self, outcome: &SyncOutcome) -> SyncResult<()> {
        let Some(repository) = &self.state else {
            debug!("state persistence disabled, skipping snapshot");
            return Ok(());
        };

        let state = State::new(
            outcome.groups.clone(),
            outcome.users.clone(),
            outcome.groups_members.clone(),
        )
        .with_code_version(&self.code_version);

        self.guard(SyncPhase::SaveState, repository.set_state(&state))
            .await?;
        info!(last_sync = %state.last_sync, hash = %state.hash_code, "snapshot written");
        Ok(())
    }

    /// Run one adapter call under the cancellation signal, tagging failures
    /// with the phase that issued them. Cancellation abandons the call and
    /// the run; any later snapshot write is thereby skipped too.
    async fn guard<T>(
        &self,
        phase: SyncPhase,
        operation: impl Future<Output = ProviderResult<T>>,
    ) -> SyncResult<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SyncError::Cancelled { phase }),
            result = operation => result.map_err(|source| SyncError::Phase { phase, source }),
        }
    }
}
