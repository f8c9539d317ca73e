//! Group entity and its result container.

use serde::{Deserialize, Serialize};

use super::hash::FieldDigest;

/// A named collection of members.
///
/// `name` is the cross-system natural key: the target keys groups by display
/// name, so a rename upstream reads as delete-then-create downstream. Names
/// must be unique within a single provider fetch; the provider adapter drops
/// duplicates after the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scim_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl Group {
    #[must_use]
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    /// Recompute the hash code from the identity attributes.
    pub fn set_hash_code(&mut self) {
        let mut digest = FieldDigest::new();
        digest.field(&self.ipid);
        digest.field(&self.name);
        digest.field(&self.email);
        self.hash_code = digest.finish();
    }
}

/// Builder for [`Group`].
#[derive(Debug, Default)]
pub struct GroupBuilder {
    group: Group,
}

impl GroupBuilder {
    #[must_use]
    pub fn ipid(mut self, value: impl Into<String>) -> Self {
        self.group.ipid = value.into();
        self
    }

    #[must_use]
    pub fn scim_id(mut self, value: impl Into<String>) -> Self {
        self.group.scim_id = value.into();
        self
    }

    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.group.name = value.into();
        self
    }

    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.group.email = value.into();
        self
    }

    #[must_use]
    pub fn build(mut self) -> Group {
        self.group.set_hash_code();
        self.group
    }
}

/// Collection of groups with an order-independent hash code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsResult {
    pub items: usize,
    pub resources: Vec<Group>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl GroupsResult {
    /// Build a result set, hashing only when non-empty. Diff partitions and
    /// merges keep empty sets unhashed.
    #[must_use]
    pub fn new(resources: Vec<Group>) -> Self {
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
    /// adapter fetch paths report even an empty directory.
    #[must_use]
    pub fn hashed(resources: Vec<Group>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        result.set_hash_code();
        result
    }

    /// Recompute the hash code over children rehashed and sorted by name.
    pub fn set_hash_code(&mut self) {
        let mut children = self.resources.clone();
        for group in &mut children {
            group.set_hash_code();
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut digest = FieldDigest::new();
        digest.count(self.items);
        for group in &children {
            digest.field(&group.hash_code);
        }
        self.hash_code = digest.finish();
    }
}
