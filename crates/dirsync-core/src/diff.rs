//! Diff kernel: pure partitioning of provider state against target state.
//!
//! Each function takes the provider's view and the target's view (live SCIM
//! state on a first run, the prior snapshot on incremental runs) and returns
//! freshly allocated partitions; inputs are never mutated. The one piece of
//! data copied across sides is the target-issued `scim_id`, back-filled onto
//! the copies destined for the output so later mutation phases can address
//! the target directly.

use std::collections::{HashMap, HashSet};

use crate::error::DiffError;
use crate::model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, User, UsersResult,
};

/// Partitions produced by [`users_operations`].
#[derive(Debug, Clone)]
pub struct UsersDiff {
    pub create: UsersResult,
    pub update: UsersResult,
    pub equal: UsersResult,
    pub delete: UsersResult,
}

/// Partitions produced by [`groups_operations`].
#[derive(Debug, Clone)]
pub struct GroupsDiff {
    pub create: GroupsResult,
    pub update: GroupsResult,
    pub equal: GroupsResult,
    pub delete: GroupsResult,
}

/// Partitions produced by [`members_operations`]. Membership rows are added
/// or removed, never updated.
#[derive(Debug, Clone)]
pub struct MembersDiff {
    pub create: GroupsMembersResult,
    pub equal: GroupsMembersResult,
    pub delete: GroupsMembersResult,
}

/// Partition users by email (case-sensitive).
///
/// A user known to both sides is compared over
/// `(given_name, family_name, active, ipid)`; any difference lands it in
/// `update`, otherwise `equal`. Either way the target's `scim_id` is
/// back-filled onto the output copy.
pub fn users_operations(
    idp: Option<&UsersResult>,
    scim: Option<&UsersResult>,
) -> Result<UsersDiff, DiffError> {
    let idp = idp.ok_or(DiffError::IdentityProviderUsersNil)?;
    let scim = scim.ok_or(DiffError::ScimUsersNil)?;

    let idp_keys: HashSet<&str> = idp.resources.iter().map(|u| u.email.as_str()).collect();
    let scim_users: HashMap<&str, &User> = scim
        .resources
        .iter()
        .map(|u| (u.email.as_str(), u))
        .collect();

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    let mut to_equal = Vec::new();
    let mut to_delete = Vec::new();

    for user in &idp.resources {
        match scim_users.get(user.email.as_str()) {
            None => to_create.push(user.clone()),
            Some(existing) => {
                let mut user = user.clone();
                user.scim_id = existing.scim_id.clone();

                let changed = user.name.family_name != existing.name.family_name
                    || user.name.given_name != existing.name.given_name
                    || user.active != existing.active
                    || user.ipid != existing.ipid;

                if changed {
                    to_update.push(user);
                } else {
                    to_equal.push(user);
                }
            }
        }
    }

    for user in &scim.resources {
        if !idp_keys.contains(user.email.as_str()) {
            to_delete.push(user.clone());
        }
    }

    Ok(UsersDiff {
        create: UsersResult::new(to_create),
        update: UsersResult::new(to_update),
        equal: UsersResult::new(to_equal),
        delete: UsersResult::new(to_delete),
    })
}

/// Partition groups by name.
///
/// The only comparable attribute is `ipid`: the target keys groups by
/// display name and exposes no other provider-owned metadata, so a rename
/// upstream surfaces as delete-plus-create rather than update.
pub fn groups_operations(
    idp: Option<&GroupsResult>,
    scim: Option<&GroupsResult>,
) -> Result<GroupsDiff, DiffError> {
    let idp = idp.ok_or(DiffError::IdentityProviderGroupsNil)?;
    let scim = scim.ok_or(DiffError::ScimGroupsNil)?;

    let idp_keys: HashSet<&str> = idp.resources.iter().map(|g| g.name.as_str()).collect();
    let scim_groups: HashMap<&str, &Group> = scim
        .resources
        .iter()
        .map(|g| (g.name.as_str(), g))
        .collect();

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    let mut to_equal = Vec::new();
    let mut to_delete = Vec::new();

    for group in &idp.resources {
        match scim_groups.get(group.name.as_str()) {
            None => to_create.push(group.clone()),
            Some(existing) => {
                let mut group = group.clone();
                group.scim_id = existing.scim_id.clone();

                if group.ipid != existing.ipid {
                    to_update.push(group);
                } else {
                    to_equal.push(group);
                }
            }
        }
    }

    for group in &scim.resources {
        if !idp_keys.contains(group.name.as_str()) {
            to_delete.push(group.clone());
        }
    }

    Ok(GroupsDiff {
        create: GroupsResult::new(to_create),
        update: GroupsResult::new(to_update),
        equal: GroupsResult::new(to_equal),
        delete: GroupsResult::new(to_delete),
    })
}

/// Partition group memberships by group name and member email.
///
/// Per provider-side group: members unknown to the target go to `create`,
/// known members to `equal` with their `scim_id` back-filled. A group that is
/// empty on both sides still yields an `equal` entry with no members, so the
/// driver can see the group was observed. Per target-side group that the
/// provider still has: members gone from the provider go to `delete`. Groups
/// the provider no longer has at all are left alone here — the group diff
/// deletes them wholesale and the target cascades their membership rows.
pub fn members_operations(
    idp: Option<&GroupsMembersResult>,
    scim: Option<&GroupsMembersResult>,
) -> Result<MembersDiff, DiffError> {
    let idp = idp.ok_or(DiffError::IdentityProviderGroupsMembersNil)?;
    let scim = scim.ok_or(DiffError::ScimGroupsMembersNil)?;

    // Member sets keyed by group name then email. Entries for the same group
    // are merged, so a snapshot holding a group split across records still
    // reads as one membership set.
    let mut idp_members: HashMap<&str, HashMap<&str, &Member>> = HashMap::new();
    for group_members in &idp.resources {
        let bucket = idp_members
            .entry(group_members.group.name.as_str())
            .or_default();
        for member in &group_members.resources {
            bucket.insert(member.email.as_str(), member);
        }
    }

    let mut scim_members: HashMap<&str, HashMap<&str, &Member>> = HashMap::new();
    let mut scim_groups: HashMap<&str, &Group> = HashMap::new();
    for group_members in &scim.resources {
        scim_groups.insert(group_members.group.name.as_str(), &group_members.group);
        let bucket = scim_members
            .entry(group_members.group.name.as_str())
            .or_default();
        for member in &group_members.resources {
            bucket.insert(member.email.as_str(), member);
        }
    }

    let mut to_create = Vec::new();
    let mut to_equal = Vec::new();
    let mut to_delete = Vec::new();

    for group_members in &idp.resources {
        let name = group_members.group.name.as_str();
        let scim_bucket = scim_members.get(name);

        // Known on both sides with no members anywhere: surface the group in
        // `equal` so the observation itself is recorded.
        let empty_on_both = scim_bucket.is_some_and(|bucket| bucket.is_empty())
            && idp_members.get(name).is_some_and(|bucket| bucket.is_empty());

        let mut group = group_members.group.clone();
        if group.scim_id.is_empty() {
            if let Some(existing) = scim_groups.get(name) {
                group.scim_id = existing.scim_id.clone();
            }
        }
        group.set_hash_code();

        let mut create_bucket = Vec::new();
        let mut equal_bucket = Vec::new();
        for member in &group_members.resources {
            match scim_bucket.and_then(|bucket| bucket.get(member.email.as_str())) {
                None => create_bucket.push(member.clone()),
                Some(existing) => {
                    let mut member = member.clone();
                    member.scim_id = existing.scim_id.clone();
                    equal_bucket.push(member);
                }
            }
        }

        if !create_bucket.is_empty() {
            to_create.push(GroupMembers::new(group.clone(), create_bucket));
        }
        if empty_on_both || !equal_bucket.is_empty() {
            to_equal.push(GroupMembers::new(group, equal_bucket));
        }
    }

    for group_members in &scim.resources {
        let name = group_members.group.name.as_str();
        let Some(idp_bucket) = idp_members.get(name) else {
            continue;
        };

        let gone: Vec<Member> = group_members
            .resources
            .iter()
            .filter(|member| !idp_bucket.contains_key(member.email.as_str()))
            .cloned()
            .collect();

        if !gone.is_empty() {
            let mut group = group_members.group.clone();
            group.set_hash_code();
            to_delete.push(GroupMembers::new(group, gone));
        }
    }

    Ok(MembersDiff {
        create: GroupsMembersResult::new(to_create),
        equal: GroupsMembersResult::new(to_equal),
        delete: GroupsMembersResult::new(to_delete),
    })
}
