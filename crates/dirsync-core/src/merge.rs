//! Flatten several result sets into one, recomputing the hash.
//!
//! Used by the driver to compose the next snapshot out of the surviving diff
//! partitions. Concatenation order does not matter for the hash.

use crate::model::{GroupsMembersResult, GroupsResult, UsersResult};

pub fn merge_users_result(results: &[&UsersResult]) -> UsersResult {
    UsersResult::new(
        results
            .iter()
            .flat_map(|r| r.resources.iter().cloned())
            .collect(),
    )
}

pub fn merge_groups_result(results: &[&GroupsResult]) -> GroupsResult {
    GroupsResult::new(
        results
            .iter()
            .flat_map(|r| r.resources.iter().cloned())
            .collect(),
    )
}

pub fn merge_groups_members_result(results: &[&GroupsMembersResult]) -> GroupsMembersResult {
    GroupsMembersResult::new(
        results
            .iter()
            .flat_map(|r| r.resources.iter().cloned())
            .collect(),
    )
}
