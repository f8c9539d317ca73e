//! `ScimProvider` port implementation over the HTTP client.
//!
//! Mutations are idempotent over natural keys: a create answered with 409 is
//! resolved by looking the resource up and adopting the target's id, and a
//! delete answered with 404 is treated as already done. Re-issuing a
//! partition after a partial failure therefore never double-applies.

use std::collections::HashMap;

use async_trait::async_trait;
use dirsync_core::error::{ProviderError, ProviderResult};
use dirsync_core::model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, User, UsersResult,
};
use dirsync_core::traits::ScimProvider;
use tracing::{debug, warn};

use crate::client::ScimClient;
use crate::error::ScimError;
use crate::wire::{PatchRequest, ScimEmail, ScimGroup, ScimName, ScimUser};

/// SCIM tenant as seen through the driver's port.
pub struct ScimTargetProvider {
    client: ScimClient,
}

impl ScimTargetProvider {
    #[must_use]
    pub fn new(client: ScimClient) -> Self {
        Self { client }
    }

    /// Resolve a user's target id by natural key when the model carries
    /// none. `Ok(None)` means the user does not exist on the target.
    async fn find_user_id(
        &self,
        user: &User,
        operation: &'static str,
    ) -> ProviderResult<Option<String>> {
        if !user.scim_id.is_empty() {
            return Ok(Some(user.scim_id.clone()));
        }
        Ok(self
            .client
            .get_user_by_user_name(&user.email)
            .await
            .map_err(|e| port_error(operation, e))?
            .map(|existing| existing.id))
    }

    /// Resolve a user id that must exist for the operation to make sense.
    async fn user_id(&self, user: &User, operation: &'static str) -> ProviderResult<String> {
        self.find_user_id(user, operation).await?.ok_or_else(|| {
            ProviderError::operation(
                operation,
                format!("user {} not found on the target", user.email),
            )
        })
    }

    /// Resolve a group's target id by natural key when the model carries
    /// none. `Ok(None)` means the group does not exist on the target.
    async fn find_group_id(
        &self,
        group: &Group,
        operation: &'static str,
    ) -> ProviderResult<Option<String>> {
        if !group.scim_id.is_empty() {
            return Ok(Some(group.scim_id.clone()));
        }
        Ok(self
            .client
            .get_group_by_display_name(&group.name)
            .await
            .map_err(|e| port_error(operation, e))?
            .map(|existing| existing.id))
    }

    /// Resolve a group id that must exist for the operation to make sense.
    async fn group_id(&self, group: &Group, operation: &'static str) -> ProviderResult<String> {
        self.find_group_id(group, operation).await?.ok_or_else(|| {
            ProviderError::operation(
                operation,
                format!("group {} not found on the target", group.name),
            )
        })
    }
}

fn port_error(operation: &'static str, source: ScimError) -> ProviderError {
    ProviderError::Operation {
        operation,
        message: source.to_string(),
        source: Some(Box::new(source)),
    }
}

fn user_to_wire(user: &User) -> ScimUser {
    ScimUser {
        schemas: Vec::new(),
        id: user.scim_id.clone(),
        external_id: user.ipid.clone(),
        user_name: user.email.clone(),
        name: ScimName {
            family_name: user.name.family_name.clone(),
            given_name: user.name.given_name.clone(),
        },
        display_name: user.display_name.clone(),
        active: user.active,
        emails: vec![ScimEmail::primary_work(&user.email)],
    }
}

fn wire_to_user(user: &ScimUser) -> User {
    User::builder()
        .ipid(&user.external_id)
        .scim_id(&user.id)
        .email(&user.user_name)
        .given_name(&user.name.given_name)
        .family_name(&user.name.family_name)
        .display_name(&user.display_name)
        .active(user.active)
        .build()
}

fn wire_to_group(group: &ScimGroup) -> Group {
    Group::builder()
        .ipid(&group.external_id)
        .scim_id(&group.id)
        .name(&group.display_name)
        .build()
}

#[async_trait]
impl ScimProvider for ScimTargetProvider {
    async fn get_users(&self) -> ProviderResult<UsersResult> {
        let users = self
            .client
            .list_users(None)
            .await
            .map_err(|e| port_error("get users", e))?;
        Ok(UsersResult::hashed(users.iter().map(wire_to_user).collect()))
    }

    async fn get_groups(&self) -> ProviderResult<GroupsResult> {
        let groups = self
            .client
            .list_groups(None)
            .await
            .map_err(|e| port_error("get groups", e))?;
        Ok(GroupsResult::hashed(groups.iter().map(wire_to_group).collect()))
    }

    async fn get_groups_members(&self) -> ProviderResult<GroupsMembersResult> {
        let groups = self
            .client
            .list_groups(None)
            .await
            .map_err(|e| port_error("get groups members", e))?;
        let users = self
            .client
            .list_users(None)
            .await
            .map_err(|e| port_error("get groups members", e))?;

        let by_id: HashMap<&str, &ScimUser> =
            users.iter().map(|u| (u.id.as_str(), u)).collect();

        let mut resources = Vec::new();
        for group in &groups {
            let mut members = Vec::new();
            for member in &group.members {
                let Some(user) = by_id.get(member.value.as_str()) else {
                    // Dangling member reference; the next reconciliation
                    // will converge it, so it is only worth a warning here.
                    warn!(group = %group.display_name, member = %member.value, "group member without a user resource");
                    continue;
                };
                members.push(
                    Member::builder()
                        .ipid(&user.external_id)
                        .scim_id(&user.id)
                        .email(&user.user_name)
                        .build(),
                );
            }
            resources.push(GroupMembers::new(wire_to_group(group), members));
        }
        Ok(GroupsMembersResult::hashed(resources))
    }

    async fn create_users(&self, users: &UsersResult) -> ProviderResult<UsersResult> {
        let mut created = Vec::new();
        for user in &users.resources {
            let wire = user_to_wire(user);
            let result = match self.client.create_user(&wire).await {
                Ok(result) => result,
                Err(ScimError::Conflict(_)) => {
                    // Already there (a previous partially-failed run):
                    // adopt it and reassert the attributes.
                    debug!(user = %user.email, "user already exists on the target, adopting");
                    let existing = self
                        .client
                        .get_user_by_user_name(&user.email)
                        .await
                        .map_err(|e| port_error("create users", e))?
                        .ok_or_else(|| {
                            ProviderError::operation(
                                "create users",
                                format!("conflict for {} but lookup found nothing", user.email),
                            )
                        })?;
                    self.client
                        .put_user(&existing.id, &wire)
                        .await
                        .map_err(|e| port_error("create users", e))?
                }
                Err(e) => return Err(port_error("create users", e)),
            };
            debug!(user = %user.email, scim_id = %result.id, "user created");
            created.push(wire_to_user(&result));
        }
        Ok(UsersResult::hashed(created))
    }

    async fn update_users(&self, users: &UsersResult) -> ProviderResult<UsersResult> {
        let mut updated = Vec::new();
        for user in &users.resources {
            let id = self.user_id(user, "update users").await?;
            let result = self
                .client
                .put_user(&id, &user_to_wire(user))
                .await
                .map_err(|e| port_error("update users", e))?;
            debug!(user = %user.email, scim_id = %result.id, "user updated");
            updated.push(wire_to_user(&result));
        }
        Ok(UsersResult::hashed(updated))
    }

    async fn delete_users(&self, users: &UsersResult) -> ProviderResult<()> {
        for user in &users.resources {
            let Some(id) = self.find_user_id(user, "delete users").await? else {
                debug!(user = %user.email, "user already gone from the target");
                continue;
            };
            match self.client.delete_user(&id).await {
                Ok(()) | Err(ScimError::NotFound(_)) => {
                    debug!(user = %user.email, "user deleted");
                }
                Err(e) => return Err(port_error("delete users", e)),
            }
        }
        Ok(())
    }

    async fn create_groups(&self, groups: &GroupsResult) -> ProviderResult<GroupsResult> {
        let mut created = Vec::new();
        for group in &groups.resources {
            let wire = ScimGroup {
                schemas: Vec::new(),
                id: String::new(),
                external_id: group.ipid.clone(),
                display_name: group.name.clone(),
                members: Vec::new(),
            };
            let result = match self.client.create_group(&wire).await {
                Ok(result) => result,
                Err(ScimError::Conflict(_)) => {
                    debug!(group = %group.name, "group already exists on the target, adopting");
                    self.client
                        .get_group_by_display_name(&group.name)
                        .await
                        .map_err(|e| port_error("create groups", e))?
                        .ok_or_else(|| {
                            ProviderError::operation(
                                "create groups",
                                format!("conflict for {} but lookup found nothing", group.name),
                            )
                        })?
                }
                Err(e) => return Err(port_error("create groups", e)),
            };
            debug!(group = %group.name, scim_id = %result.id, "group created");
            let mut model = group.clone();
            model.scim_id = result.id;
            created.push(model);
        }
        Ok(GroupsResult::hashed(created))
    }

    async fn delete_groups(&self, groups: &GroupsResult) -> ProviderResult<()> {
        for group in &groups.resources {
            let Some(id) = self.find_group_id(group, "delete groups").await? else {
                debug!(group = %group.name, "group already gone from the target");
                continue;
            };
            match self.client.delete_group(&id).await {
                Ok(()) | Err(ScimError::NotFound(_)) => {
                    debug!(group = %group.name, "group deleted");
                }
                Err(e) => return Err(port_error("delete groups", e)),
            }
        }
        Ok(())
    }

    async fn create_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<GroupsMembersResult> {
        let mut created = Vec::new();
        for group_members in &groups_members.resources {
            let mut group = group_members.group.clone();
            group.scim_id = self.group_id(&group, "create groups members").await?;

            let mut members = Vec::new();
            let mut member_ids = Vec::new();
            for member in &group_members.resources {
                let mut member = member.clone();
                if member.scim_id.is_empty() {
                    member.scim_id = match self
                        .client
                        .get_user_by_user_name(&member.email)
                        .await
                        .map_err(|e| port_error("create groups members", e))?
                    {
                        Some(user) => user.id,
                        None => {
                            return Err(ProviderError::operation(
                                "create groups members",
                                format!("member {} has no user on the target", member.email),
                            ))
                        }
                    };
                }
                member_ids.push(member.scim_id.clone());
                members.push(member);
            }

            if !member_ids.is_empty() {
                self.client
                    .patch_group(&group.scim_id, &PatchRequest::add_members(&member_ids))
                    .await
                    .map_err(|e| port_error("create groups members", e))?;
            }
            debug!(group = %group.name, members = member_ids.len(), "membership rows added");
            created.push(GroupMembers::new(group, members));
        }
        Ok(GroupsMembersResult::hashed(created))
    }

    async fn delete_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<()> {
        for group_members in &groups_members.resources {
            let group_id = self
                .group_id(&group_members.group, "delete groups members")
                .await?;

            let mut member_ids = Vec::new();
            for member in &group_members.resources {
                if member.scim_id.is_empty() {
                    match self
                        .client
                        .get_user_by_user_name(&member.email)
                        .await
                        .map_err(|e| port_error("delete groups members", e))?
                    {
                        Some(user) => member_ids.push(user.id),
                        // Row is gone together with its user.
                        None => continue,
                    }
                } else {
                    member_ids.push(member.scim_id.clone());
                }
            }

            if !member_ids.is_empty() {
                self.client
                    .patch_group(&group_id, &PatchRequest::remove_members(&member_ids))
                    .await
                    .map_err(|e| port_error("delete groups members", e))?;
            }
            debug!(group = %group_members.group.name, members = member_ids.len(), "membership rows removed");
        }
        Ok(())
    }
}
