//! Membership entities: a group's reference to a user, and the per-group
//! member lists the diff kernel works over.
//!
//! Nested groups are flattened before these types are built: the provider
//! adapter requests transitive expansion upstream and discards group-kind
//! entries, so a `Member` always points at a human.

use serde::{Deserialize, Serialize};

use super::group::Group;
use super::hash::FieldDigest;

/// A reference a group holds to a user. `email` is the natural key within a
/// group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scim_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl Member {
    #[must_use]
    pub fn builder() -> MemberBuilder {
        MemberBuilder::default()
    }

    /// Recompute the hash code from the identity attributes.
    pub fn set_hash_code(&mut self) {
        let mut digest = FieldDigest::new();
        digest.field(&self.ipid);
        digest.field(&self.email);
        digest.field(&self.status);
        self.hash_code = digest.finish();
    }
}

/// Builder for [`Member`].
#[derive(Debug, Default)]
pub struct MemberBuilder {
    member: Member,
}

impl MemberBuilder {
    #[must_use]
    pub fn ipid(mut self, value: impl Into<String>) -> Self {
        self.member.ipid = value.into();
        self
    }

    #[must_use]
    pub fn scim_id(mut self, value: impl Into<String>) -> Self {
        self.member.scim_id = value.into();
        self
    }

    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.member.email = value.into();
        self
    }

    #[must_use]
    pub fn status(mut self, value: impl Into<String>) -> Self {
        self.member.status = value.into();
        self
    }

    #[must_use]
    pub fn build(mut self) -> Member {
        self.member.set_hash_code();
        self.member
    }
}

/// Flat member list of a single group as fetched from the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersResult {
    pub items: usize,
    pub resources: Vec<Member>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl MembersResult {
    /// Build a result set, hashing only when non-empty.
    #[must_use]
    pub fn new(resources: Vec<Member>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        if result.items > 0 {
            result.set_hash_code();
        }
        result
    }

    /// Build a result set with the hash always computed, the way the
    /// adapter fetch paths report even an empty member list.
    #[must_use]
    pub fn hashed(resources: Vec<Member>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        result.set_hash_code();
        result
    }

    /// Recompute the hash code over children rehashed and sorted by email.
    pub fn set_hash_code(&mut self) {
        let mut children = self.resources.clone();
        for member in &mut children {
            member.set_hash_code();
        }
        children.sort_by(|a, b| a.email.cmp(&b.email));

        let mut digest = FieldDigest::new();
        digest.count(self.items);
        for member in &children {
            digest.field(&member.hash_code);
        }
        self.hash_code = digest.finish();
    }
}

/// A group together with its direct, flattened member list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembers {
    pub items: usize,
    pub group: Group,
    pub resources: Vec<Member>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl GroupMembers {
    /// Build one group's member list. The hash is always computed: the
    /// non-empty guard applies to the top-level result containers, not to
    /// per-group entries, which carry the group's own identity even with
    /// zero members.
    #[must_use]
    pub fn new(group: Group, resources: Vec<Member>) -> Self {
        let mut result = Self {
            items: resources.len(),
            group,
            resources,
            hash_code: String::new(),
        };
        result.set_hash_code();
        result
    }

    #[must_use]
    pub fn builder() -> GroupMembersBuilder {
        GroupMembersBuilder::default()
    }

    /// Recompute the hash code: the group's own hash plus the member hashes
    /// sorted by email, digested together with `items`.
    pub fn set_hash_code(&mut self) {
        let mut group = self.group.clone();
        group.set_hash_code();

        let mut children = self.resources.clone();
        for member in &mut children {
            member.set_hash_code();
        }
        children.sort_by(|a, b| a.email.cmp(&b.email));

        let mut digest = FieldDigest::new();
        digest.count(self.items);
        digest.field(&group.hash_code);
        for member in &children {
            digest.field(&member.hash_code);
        }
        self.hash_code = digest.finish();
    }
}

/// Builder for [`GroupMembers`].
#[derive(Debug, Default)]
pub struct GroupMembersBuilder {
    group: Group,
    resources: Vec<Member>,
}

impl GroupMembersBuilder {
    #[must_use]
    pub fn group(mut self, value: Group) -> Self {
        self.group = value;
        self
    }

    #[must_use]
    pub fn resources(mut self, value: Vec<Member>) -> Self {
        self.resources = value;
        self
    }

    #[must_use]
    pub fn build(self) -> GroupMembers {
        GroupMembers::new(self.group, self.resources)
    }
}

/// Collection of per-group member lists with an order-independent hash code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsMembersResult {
    pub items: usize,
    pub resources: Vec<GroupMembers>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl GroupsMembersResult {
    /// Build a result set, hashing only when non-empty. Diff partitions and
    /// merges keep empty sets unhashed.
    #[must_use]
    pub fn new(resources: Vec<GroupMembers>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        if result.items > 0 {
            result.set_hash_code();
        }
        result
    }

    /// Build a result set with the hash always computed, the way the
    /// adapter fetch paths report even a directory with no groups.
    #[must_use]
    pub fn hashed(resources: Vec<GroupMembers>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        result.set_hash_code();
        result
    }

    /// Recompute the hash code over children rehashed and sorted by group
    /// name.
    pub fn set_hash_code(&mut self) {
        let mut children = self.resources.clone();
        for group_members in &mut children {
            group_members.set_hash_code();
        }
        children.sort_by(|a, b| a.group.name.cmp(&b.group.name));

        let mut digest = FieldDigest::new();
        digest.count(self.items);
        for group_members in &children {
            digest.field(&group_members.hash_code);
        }
        self.hash_code = digest.finish();
    }
}
