//! In-memory fakes for the three adapter ports.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dirsync_core::error::{ProviderError, ProviderResult};
use dirsync_core::model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, MembersResult, State, User,
    UsersResult,
};
use dirsync_core::traits::{IdentityProvider, ScimProvider, StateRepository};

pub fn user(email: &str, ipid: &str) -> User {
    User::builder()
        .ipid(ipid)
        .email(email)
        .given_name("Given")
        .family_name("Family")
        .display_name("Given Family")
        .active(true)
        .build()
}

pub fn group(name: &str, ipid: &str) -> Group {
    Group::builder()
        .ipid(ipid)
        .name(name)
        .email(format!("{name}@mail.com"))
        .build()
}

pub fn member(email: &str, ipid: &str) -> Member {
    Member::builder().ipid(ipid).email(email).status("ACTIVE").build()
}

/// Fixture-backed identity provider. Groups are assumed unique by name (the
/// real adapter enforces that before the driver ever sees them).
#[derive(Default)]
pub struct FakeDirectory {
    pub groups: Vec<Group>,
    /// Members per group name.
    pub members: HashMap<String, Vec<Member>>,
    /// Users per email, for member hydration.
    pub users: HashMap<String, User>,
}

impl FakeDirectory {
    pub fn with_group(mut self, group: Group, members: Vec<Member>) -> Self {
        self.members.insert(group.name.clone(), members);
        self.groups.push(group);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.email.clone(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeDirectory {
    async fn get_groups(&self, _filter: &[String]) -> ProviderResult<GroupsResult> {
        Ok(GroupsResult::hashed(self.groups.clone()))
    }

    async fn get_users(&self, _filter: &[String]) -> ProviderResult<UsersResult> {
        Ok(UsersResult::hashed(self.users.values().cloned().collect()))
    }

    async fn get_group_members(&self, group_id: &str) -> ProviderResult<MembersResult> {
        if group_id.is_empty() {
            return Err(ProviderError::EmptyIdentifier {
                operation: "get group members",
                field: "group id",
            });
        }
        let members = self
            .groups
            .iter()
            .find(|g| g.ipid == group_id)
            .and_then(|g| self.members.get(&g.name))
            .cloned()
            .unwrap_or_default();
        Ok(MembersResult::hashed(members))
    }

    async fn get_users_by_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<UsersResult> {
        let mut seen = Vec::new();
        let mut users = Vec::new();
        for group_members in &groups_members.resources {
            for member in &group_members.resources {
                if seen.contains(&member.email) {
                    continue;
                }
                seen.push(member.email.clone());
                let user = self.users.get(&member.email).cloned().ok_or_else(|| {
                    ProviderError::operation("get user", format!("unknown user {}", member.email))
                })?;
                users.push(user);
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
            resources.push(GroupMembers::new(group.clone(), members.resources));
        }
        Ok(GroupsMembersResult::hashed(resources))
    }
}

/// Mutable in-memory SCIM target. Records every mutation in call order and
/// can be primed to fail a named operation, for partial-failure tests.
#[derive(Default)]
pub struct FakeScim {
    inner: Mutex<ScimState>,
    pub fail_on: Option<&'static str>,
}

#[derive(Default)]
struct ScimState {
    users: Vec<User>,
    groups: Vec<Group>,
    /// Membership rows per group name.
    members: HashMap<String, Vec<Member>>,
    next_id: usize,
    calls: Vec<&'static str>,
}

impl ScimState {
    fn issue_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("scim-{kind}-{}", self.next_id)
    }
}

impl FakeScim {
    pub fn seeded(users: Vec<User>, groups: Vec<Group>, members: HashMap<String, Vec<Member>>) -> Self {
        Self {
            inner: Mutex::new(ScimState {
                users,
                groups,
                members,
                next_id: 1000,
                calls: Vec::new(),
            }),
            fail_on: None,
        }
    }

    pub fn failing_on(op: &'static str) -> Self {
        Self {
            fail_on: Some(op),
            ..Self::default()
        }
    }

    /// Mutation calls in the order the driver issued them.
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn user_emails(&self) -> Vec<String> {
        let mut emails: Vec<String> = self
            .inner
            .lock()
            .unwrap()
            .users
            .iter()
            .map(|u| u.email.clone())
            .collect();
        emails.sort();
        emails
    }

    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .lock()
            .unwrap()
            .groups
            .iter()
            .map(|g| g.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn members_of(&self, group_name: &str) -> Vec<String> {
        let mut emails: Vec<String> = self
            .inner
            .lock()
            .unwrap()
            .members
            .get(group_name)
            .map(|m| m.iter().map(|m| m.email.clone()).collect())
            .unwrap_or_default();
        emails.sort();
        emails
    }

    fn check(&self, op: &'static str) -> ProviderResult<()> {
        self.inner.lock().unwrap().calls.push(op);
        if self.fail_on == Some(op) {
            return Err(ProviderError::operation(op, "primed to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl ScimProvider for FakeScim {
    async fn get_users(&self) -> ProviderResult<UsersResult> {
        Ok(UsersResult::hashed(self.inner.lock().unwrap().users.clone()))
    }

    async fn get_groups(&self) -> ProviderResult<GroupsResult> {
        Ok(GroupsResult::hashed(self.inner.lock().unwrap().groups.clone()))
    }

    async fn get_groups_members(&self) -> ProviderResult<GroupsMembersResult> {
        let inner = self.inner.lock().unwrap();
        let resources = inner
            .groups
            .iter()
            .map(|group| {
                GroupMembers::new(
                    group.clone(),
                    inner.members.get(&group.name).cloned().unwrap_or_default(),
                )
            })
            .collect();
        Ok(GroupsMembersResult::hashed(resources))
    }

    async fn create_users(&self, users: &UsersResult) -> ProviderResult<UsersResult> {
        self.check("create_users")?;
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::new();
        for user in &users.resources {
            let mut user = user.clone();
            user.scim_id = inner.issue_id("user");
            inner.users.push(user.clone());
            created.push(user);
        }
        Ok(UsersResult::hashed(created))
    }

    async fn update_users(&self, users: &UsersResult) -> ProviderResult<UsersResult> {
        self.check("update_users")?;
        let mut inner = self.inner.lock().unwrap();
        for user in &users.resources {
            if let Some(existing) = inner.users.iter_mut().find(|u| u.email == user.email) {
                let scim_id = existing.scim_id.clone();
                *existing = user.clone();
                existing.scim_id = scim_id;
            }
        }
        Ok(users.clone())
    }

    async fn delete_users(&self, users: &UsersResult) -> ProviderResult<()> {
        self.check("delete_users")?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .users
            .retain(|u| !users.resources.iter().any(|d| d.email == u.email));
        Ok(())
    }

    async fn create_groups(&self, groups: &GroupsResult) -> ProviderResult<GroupsResult> {
        self.check("create_groups")?;
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::new();
        for group in &groups.resources {
            let mut group = group.clone();
            group.scim_id = inner.issue_id("group");
            inner.groups.push(group.clone());
            created.push(group);
        }
        Ok(GroupsResult::hashed(created))
    }

    async fn delete_groups(&self, groups: &GroupsResult) -> ProviderResult<()> {
        self.check("delete_groups")?;
        let mut inner = self.inner.lock().unwrap();
        for group in &groups.resources {
            inner.members.remove(&group.name);
        }
        inner
            .groups
            .retain(|g| !groups.resources.iter().any(|d| d.name == g.name));
        Ok(())
    }

    async fn create_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<GroupsMembersResult> {
        self.check("create_groups_members")?;
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::new();
        for group_members in &groups_members.resources {
            let mut group = group_members.group.clone();
            if group.scim_id.is_empty() {
                group.scim_id = inner
                    .groups
                    .iter()
                    .find(|g| g.name == group.name)
                    .map(|g| g.scim_id.clone())
                    .unwrap_or_default();
            }
            let mut members = Vec::new();
            for member in &group_members.resources {
                let mut member = member.clone();
                if member.scim_id.is_empty() {
                    member.scim_id = inner
                        .users
                        .iter()
                        .find(|u| u.email == member.email)
                        .map(|u| u.scim_id.clone())
                        .unwrap_or_default();
                }
                inner
                    .members
                    .entry(group.name.clone())
                    .or_default()
                    .push(member.clone());
                members.push(member);
            }
            created.push(GroupMembers::new(group, members));
        }
        Ok(GroupsMembersResult::hashed(created))
    }

    async fn delete_groups_members(
        &self,
        groups_members: &GroupsMembersResult,
    ) -> ProviderResult<()> {
        self.check("delete_groups_members")?;
        let mut inner = self.inner.lock().unwrap();
        for group_members in &groups_members.resources {
            if let Some(rows) = inner.members.get_mut(&group_members.group.name) {
                rows.retain(|m| {
                    !group_members
                        .resources
                        .iter()
                        .any(|d| d.email == m.email)
                });
            }
        }
        Ok(())
    }
}

/// Snapshot store backed by a mutex.
#[derive(Default)]
pub struct MemoryStateRepository {
    state: Mutex<Option<State>>,
}

impl MemoryStateRepository {
    pub fn snapshot(&self) -> Option<State> {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateRepository for MemoryStateRepository {
    async fn get_state(&self) -> ProviderResult<Option<State>> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn set_state(&self, state: &State) -> ProviderResult<()> {
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
