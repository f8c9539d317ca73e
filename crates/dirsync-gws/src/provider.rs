//! `IdentityProvider` port implementation over the directory surface.

use std::collections::HashSet;

use async_trait::async_trait;
use dirsync_core::error::{ProviderError, ProviderResult};
use dirsync_core::model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, MembersResult, User,
    UsersResult,
};
use dirsync_core::traits::IdentityProvider;
use tracing::warn;

use crate::client::DirectoryApi;
use crate::error::GwsError;
use crate::wire::{GwsUser, MEMBER_TYPE_GROUP};

/// Google Workspace as seen through the driver's port.
pub struct GwsIdentityProvider<D> {
    directory: D,
}

impl<D: DirectoryApi> GwsIdentityProvider<D> {
    #[must_use]
    pub fn new(directory: D) -> Self {
        Self { directory }
    }
}

fn port_error(operation: &'static str, source: GwsError) -> ProviderError {
    match source {
        GwsError::GroupIdEmpty => ProviderError::EmptyIdentifier {
            operation,
            field: "group id",
        },
        other => ProviderError::Operation {
            operation,
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

fn map_user(user: &GwsUser) -> User {
    User::builder()
        .ipid(&user.id)
        .given_name(&user.name.given_name)
        .family_name(&user.name.family_name)
        .display_name(format!(
            "{} {}",
            user.name.given_name, user.name.family_name
        ))
        .email(&user.primary_email)
        .active(!user.suspended)
        .build()
}

#[async_trait]
impl<D: DirectoryApi> IdentityProvider for GwsIdentityProvider<D> {
    async fn get_groups(&self, filter: &[String]) -> ProviderResult<GroupsResult> {
        let groups = self
            .directory
            .list_groups(filter)
            .await
            .map_err(|e| port_error("get groups", e))?;

        // Group names are the cross-system key; only the first occurrence of
        // each name survives.
        let mut seen = HashSet::new();
        let mut resources = Vec::new();
        for group in &groups {
            if !seen.insert(group.name.clone()) {
                warn!(
                    id = %group.id,
                    name = %group.name,
                    email = %group.email,
                    "group with a duplicate name skipped, make group names unique upstream"
                );
                continue;
            }
            resources.push(
                Group::builder()
                    .ipid(&group.id)
                    .name(&group.name)
                    .email(&group.email)
                    .build(),
            );
        }
        Ok(GroupsResult::hashed(resources))
    }

    async fn get_users(&self, filter: &[String]) -> ProviderResult<UsersResult> {
        let users = self
            .directory
            .list_users(filter)
            .await
            .map_err(|e| port_error("get users", e))?;
        Ok(UsersResult::hashed(users.iter().map(map_user).collect()))
    }

    async fn get_group_members(&self, group_id: &str) -> ProviderResult<MembersResult> {
        if group_id.is_empty() {
            return Err(port_error("get group members", GwsError::GroupIdEmpty));
        }

        let members = self
            .directory
            .list_group_members(group_id, true)
            .await
            .map_err(|e| port_error("get group members", e))?;

        let mut resources = Vec::new();
        for member in &members {
            // Transitive expansion already surfaced this entry's humans as
            // direct members; the group edge itself is dropped.
            if member.kind == MEMBER_TYPE_GROUP {
                warn!(id = %member.id, email = %member.email, "skipping nested group entry, its members are included transitively");
                continue;
            }
            resources.push(
                Member::builder()
                    .ipid(&member.id)
                    .email(&member.email)
                    .status(&member.status)
                    .build(),
            );
        }
        Ok(MembersResult::hashed(resources))
    }

    async fn get_users_by_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<UsersResult> {
        let mut seen = HashSet::new();
        let mut users = Vec::new();

        for group_members in &groups_members.resources {
            for member in &group_members.resources {
                if !seen.insert(member.email.clone()) {
                    continue;
                }
                let user = self
                    .directory
                    .get_user(&member.email)
                    .await
                    .map_err(|e| port_error("get user", e))?;
                users.push(map_user(&user));
            }
        }
        Ok(UsersResult::hashed(users))
    }

    async fn get_groups_members(
        &self,
        groups: &GroupsResult,
    ) -> ProviderResult<GroupsMembersResult> {
        let mut resources = Vec::new();
        for group in &groups.resources {
            let members = self.get_group_members(&group.ipid).await?;
            // Empty groups still get an entry so the diff sees them.
            resources.push(
                GroupMembers::builder()
                    .group(group.clone())
                    .resources(members.resources)
                    .build(),
            );
        }
        Ok(GroupsMembersResult::hashed(resources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GwsResult;
    use crate::wire::{GwsGroup, GwsMember, GwsUserName};
    use std::collections::HashMap;

    struct FakeDirectory {
        groups: Vec<GwsGroup>,
        members: HashMap<String, Vec<GwsMember>>,
        users: HashMap<String, GwsUser>,
    }

    impl FakeDirectory {
        fn new() -> Self {
            Self {
                groups: Vec::new(),
                members: HashMap::new(),
                users: HashMap::new(),
            }
        }

        fn group(mut self, id: &str, name: &str, members: Vec<GwsMember>) -> Self {
            self.groups.push(GwsGroup {
                id: id.to_string(),
                name: name.to_string(),
                email: format!("{name}@corp.com"),
            });
            self.members.insert(id.to_string(), members);
            self
        }

        fn user(mut self, id: &str, email: &str, suspended: bool) -> Self {
            self.users.insert(
                email.to_string(),
                GwsUser {
                    id: id.to_string(),
                    primary_email: email.to_string(),
                    name: GwsUserName {
                        given_name: "Given".to_string(),
                        family_name: "Family".to_string(),
                    },
                    suspended,
                },
            );
            self
        }
    }

    fn human(id: &str, email: &str) -> GwsMember {
        GwsMember {
            id: id.to_string(),
            email: email.to_string(),
            kind: "USER".to_string(),
            status: "ACTIVE".to_string(),
        }
    }

    fn nested(id: &str, email: &str) -> GwsMember {
        GwsMember {
            id: id.to_string(),
            email: email.to_string(),
            kind: MEMBER_TYPE_GROUP.to_string(),
            status: String::new(),
        }
    }

    #[async_trait]
    impl DirectoryApi for FakeDirectory {
        async fn list_users(&self, _queries: &[String]) -> GwsResult<Vec<GwsUser>> {
            Ok(self.users.values().cloned().collect())
        }

        async fn list_groups(&self, _queries: &[String]) -> GwsResult<Vec<GwsGroup>> {
            Ok(self.groups.clone())
        }

        async fn list_group_members(
            &self,
            group_id: &str,
            _include_derived: bool,
        ) -> GwsResult<Vec<GwsMember>> {
            Ok(self.members.get(group_id).cloned().unwrap_or_default())
        }

        async fn get_user(&self, user_key: &str) -> GwsResult<GwsUser> {
            self.users
                .get(user_key)
                .cloned()
                .ok_or_else(|| GwsError::NotFound(user_key.to_string()))
        }
    }

    #[tokio::test]
    async fn duplicate_group_names_are_dropped_after_the_first() {
        let directory = FakeDirectory::new()
            .group("g1", "eng", vec![])
            .group("g2", "eng", vec![])
            .group("g3", "ops", vec![]);

        let provider = GwsIdentityProvider::new(directory);
        let groups = provider.get_groups(&[]).await.unwrap();

        assert_eq!(groups.items, 2);
        let names: Vec<&str> = groups.resources.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["eng", "ops"]);
        // The surviving "eng" is the first occurrence.
        assert_eq!(groups.resources[0].ipid, "g1");
    }

    #[tokio::test]
    async fn nested_group_entries_are_skipped() {
        let directory = FakeDirectory::new().group(
            "g1",
            "eng",
            vec![
                human("u1", "a@corp.com"),
                nested("g2", "inner@corp.com"),
                human("u2", "b@corp.com"),
            ],
        );

        let provider = GwsIdentityProvider::new(directory);
        let members = provider.get_group_members("g1").await.unwrap();

        assert_eq!(members.items, 2);
        let emails: Vec<&str> = members.resources.iter().map(|m| m.email.as_str()).collect();
        assert_eq!(emails, ["a@corp.com", "b@corp.com"]);
    }

    #[tokio::test]
    async fn empty_group_id_is_a_contract_error() {
        let provider = GwsIdentityProvider::new(FakeDirectory::new());
        let err = provider.get_group_members("").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyIdentifier { field: "group id", .. }));
    }

    #[tokio::test]
    async fn suspended_maps_to_inactive_with_composed_display_name() {
        let directory = FakeDirectory::new().user("u1", "a@corp.com", true);
        let provider = GwsIdentityProvider::new(directory);

        let users = provider.get_users(&[]).await.unwrap();
        assert_eq!(users.items, 1);
        assert!(!users.resources[0].active);
        assert_eq!(users.resources[0].display_name, "Given Family");
    }

    #[tokio::test]
    async fn users_by_groups_members_deduplicates_by_email() {
        let directory = FakeDirectory::new()
            .group("g1", "eng", vec![human("u1", "a@corp.com"), human("u2", "b@corp.com")])
            .group("g2", "ops", vec![human("u2", "b@corp.com")])
            .user("u1", "a@corp.com", false)
            .user("u2", "b@corp.com", false);

        let provider = GwsIdentityProvider::new(directory);
        let groups = provider.get_groups(&[]).await.unwrap();
        let groups_members = provider.get_groups_members(&groups).await.unwrap();
        let users = provider
            .get_users_by_groups_members(&groups_members)
            .await
            .unwrap();

        assert_eq!(users.items, 2);
    }

    #[tokio::test]
    async fn empty_groups_still_get_an_entry() {
        let directory = FakeDirectory::new().group("g1", "eng", vec![]);
        let provider = GwsIdentityProvider::new(directory);

        let groups = provider.get_groups(&[]).await.unwrap();
        let groups_members = provider.get_groups_members(&groups).await.unwrap();

        assert_eq!(groups_members.items, 1);
        assert!(groups_members.resources[0].resources.is_empty());
        assert!(!groups_members.hash_code.is_empty());
    }
}
