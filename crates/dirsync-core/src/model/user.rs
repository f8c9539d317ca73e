//! User entity and its result container.

use serde::{Deserialize, Serialize};

use super::hash::FieldDigest;

/// A person's given and family name as both directories carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub given_name: String,
}

/// Identity of a human in both systems.
///
/// `email` is the cross-system natural key. `scim_id` is empty until the
/// target has provisioned the user and never participates in the hash code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ipid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scim_id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl User {
    #[must_use]
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Recompute the hash code from every identity attribute.
    pub fn set_hash_code(&mut self) {
        let mut digest = FieldDigest::new();
        digest.field(&self.ipid);
        digest.field(&self.name.family_name);
        digest.field(&self.name.given_name);
        digest.field(&self.display_name);
        digest.flag(self.active);
        digest.field(&self.email);
        self.hash_code = digest.finish();
    }
}

/// Builder for [`User`], used by the adapters' mapping code.
#[derive(Debug, Default)]
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    #[must_use]
    pub fn ipid(mut self, value: impl Into<String>) -> Self {
        self.user.ipid = value.into();
        self
    }

    #[must_use]
    pub fn scim_id(mut self, value: impl Into<String>) -> Self {
        self.user.scim_id = value.into();
        self
    }

    #[must_use]
    pub fn given_name(mut self, value: impl Into<String>) -> Self {
        self.user.name.given_name = value.into();
        self
    }

    #[must_use]
    pub fn family_name(mut self, value: impl Into<String>) -> Self {
        self.user.name.family_name = value.into();
        self
    }

    #[must_use]
    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.user.display_name = value.into();
        self
    }

    #[must_use]
    pub fn active(mut self, value: bool) -> Self {
        self.user.active = value;
        self
    }

    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.user.email = value.into();
        self
    }

    /// Finish the user, computing its hash code.
    #[must_use]
    pub fn build(mut self) -> User {
        self.user.set_hash_code();
        self.user
    }
}

/// Collection of users with an order-independent hash code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResult {
    pub items: usize,
    pub resources: Vec<User>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_code: String,
}

impl UsersResult {
    /// Build a result set, hashing only when non-empty. Diff partitions and
    /// merges keep empty sets unhashed; an empty `hash_code` marks "nothing
    /// here" in the snapshot document.
    #[must_use]
    pub fn new(resources: Vec<User>) -> Self {
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
    pub fn hashed(resources: Vec<User>) -> Self {
        let mut result = Self {
            items: resources.len(),
            resources,
            hash_code: String::new(),
        };
        result.set_hash_code();
        result
    }

    /// Recompute the hash code. Two results with the same users in any order
    /// hash identically: children are rehashed and sorted by email before
    /// being digested together with `items`.
    pub fn set_hash_code(&mut self) {
        let mut children = self.resources.clone();
        for user in &mut children {
            user.set_hash_code();
        }
        children.sort_by(|a, b| a.email.cmp(&b.email));

        let mut digest = FieldDigest::new();
        digest.count(self.items);
        for user in &children {
            digest.field(&user.hash_code);
        }
        self.hash_code = digest.finish();
    }
}
