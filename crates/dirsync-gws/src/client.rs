//! Admin SDK Directory HTTP client with pagination.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::auth::TokenProvider;
use crate::error::{GwsError, GwsResult};
use crate::wire::{GwsGroup, GwsGroupsPage, GwsMember, GwsMembersPage, GwsUser, GwsUsersPage};

const DEFAULT_BASE_URL: &str = "https://admin.googleapis.com/admin/directory/v1";
const DEFAULT_CUSTOMER: &str = "my_customer";
const MAX_RESULTS: usize = 200;

/// The directory surface the provider mapping is written against. The HTTP
/// client implements it; tests substitute fixtures.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Users matching any of `queries`, the whole customer when empty.
    async fn list_users(&self, queries: &[String]) -> GwsResult<Vec<GwsUser>>;

    /// Groups matching any of `queries`, the whole customer when empty.
    async fn list_groups(&self, queries: &[String]) -> GwsResult<Vec<GwsGroup>>;

    /// Members of one group, transitively expanded when `include_derived`.
    async fn list_group_members(
        &self,
        group_id: &str,
        include_derived: bool,
    ) -> GwsResult<Vec<GwsMember>>;

    /// One user by id or primary email.
    async fn get_user(&self, user_key: &str) -> GwsResult<GwsUser>;
}

/// HTTP client for the Admin SDK Directory API.
pub struct DirectoryClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    customer: String,
}

impl DirectoryClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> GwsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GwsError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            customer: DEFAULT_CUSTOMER.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests, private gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GwsResult<T> {
        let token = self.tokens.token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GwsError::from_status(status.as_u16(), message));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// One filtered pass over a paged listing endpoint.
    async fn collect_users(&self, query: Option<&str>) -> GwsResult<Vec<GwsUser>> {
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/users?customer={}&maxResults={MAX_RESULTS}",
                self.base_url, self.customer
            );
            if let Some(query) = query {
                url.push_str(&format!("&query={}", urlencoding::encode(query)));
            }
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let page: GwsUsersPage = self.get_json(&url).await?;
            debug!(fetched = page.users.len(), "directory users page fetched");
            users.extend(page.users);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(users)
    }

    async fn collect_groups(&self, query: Option<&str>) -> GwsResult<Vec<GwsGroup>> {
        let mut groups = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/groups?customer={}&maxResults={MAX_RESULTS}",
                self.base_url, self.customer
            );
            if let Some(query) = query {
                url.push_str(&format!("&query={}", urlencoding::encode(query)));
            }
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let page: GwsGroupsPage = self.get_json(&url).await?;
            debug!(fetched = page.groups.len(), "directory groups page fetched");
            groups.extend(page.groups);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(groups)
    }
}

#[async_trait]
impl DirectoryApi for DirectoryClient {
    #[instrument(skip(self))]
    async fn list_users(&self, queries: &[String]) -> GwsResult<Vec<GwsUser>> {
        if queries.is_empty() {
            return self.collect_users(None).await;
        }

        // Separate passes per query; the API has no disjunction operator.
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for query in queries {
            for user in self.collect_users(Some(query)).await? {
                if seen.insert(user.id.clone()) {
                    users.push(user);
                }
            }
        }
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn list_groups(&self, queries: &[String]) -> GwsResult<Vec<GwsGroup>> {
        if queries.is_empty() {
            return self.collect_groups(None).await;
        }

        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for query in queries {
            for group in self.collect_groups(Some(query)).await? {
                if seen.insert(group.id.clone()) {
                    groups.push(group);
                }
            }
        }
        Ok(groups)
    }

    #[instrument(skip(self))]
    async fn list_group_members(
        &self,
        group_id: &str,
        include_derived: bool,
    ) -> GwsResult<Vec<GwsMember>> {
        if group_id.is_empty() {
            return Err(GwsError::GroupIdEmpty);
        }

        let mut members = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/groups/{}/members?maxResults={MAX_RESULTS}&includeDerivedMembership={include_derived}",
                self.base_url,
                urlencoding::encode(group_id),
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let page: GwsMembersPage = self.get_json(&url).await?;
            debug!(group_id, fetched = page.members.len(), "directory members page fetched");
            members.extend(page.members);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(members)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_key: &str) -> GwsResult<GwsUser> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(user_key));
        self.get_json(&url).await
    }
}
