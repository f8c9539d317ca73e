//! Snapshot of the last successfully reconciled view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::group::GroupsResult;
use super::hash::FieldDigest;
use super::member::GroupsMembersResult;
use super::user::UsersResult;

/// Schema version written into new snapshots. Loading a document with a
/// different version fails rather than guessing.
pub const STATE_SCHEMA_VERSION: i64 = 1;

/// The three reconciled result families carried by a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResources {
    pub groups: GroupsResult,
    pub users: UsersResult,
    pub groups_members: GroupsMembersResult,
}

/// Versioned snapshot persisted between runs.
///
/// The document round-trips losslessly through JSON; `hash_code` digests the
/// three resource hashes, so two snapshots are structurally equal iff their
/// top-level hashes match. `last_sync` is informational and never hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub schema_version: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code_version: String,
    pub last_sync: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
    pub resources: StateResources,
}

impl State {
    /// Compose a snapshot over the reconciled result sets, stamped now.
    #[must_use]
    pub fn new(
        groups: GroupsResult,
        users: UsersResult,
        groups_members: GroupsMembersResult,
    ) -> Self {
        let mut state = Self {
            schema_version: STATE_SCHEMA_VERSION,
            code_version: String::new(),
            last_sync: Utc::now(),
            hash_code: String::new(),
            resources: StateResources {
                groups,
                users,
                groups_members,
            },
        };
        state.set_hash_code();
        state
    }

    #[must_use]
    pub fn with_code_version(mut self, value: impl Into<String>) -> Self {
        self.code_version = value.into();
        self
    }

    /// Recompute the top-level hash from the three resource hashes.
    pub fn set_hash_code(&mut self) {
        let mut digest = FieldDigest::new();
        digest.field(&self.resources.groups.hash_code);
        digest.field(&self.resources.users.hash_code);
        digest.field(&self.resources.groups_members.hash_code);
        self.hash_code = digest.finish();
    }
}
