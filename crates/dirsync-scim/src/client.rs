//! Bearer-authenticated SCIM HTTP client with pagination.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ScimError, ScimResult};
use crate::wire::{
    ListResponse, PatchRequest, ScimGroup, ScimUser, GROUP_SCHEMA, USER_SCHEMA,
};

/// Page size for list requests.
const PAGE_SIZE: usize = 100;

/// HTTP client for one SCIM tenant endpoint.
#[derive(Debug)]
pub struct ScimClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl ScimClient {
    /// Create a client for `endpoint`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(endpoint: &str, token: SecretString) -> ScimResult<Self> {
        let base_url = Url::parse(endpoint.trim_end_matches('/'))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScimError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ScimResult<T> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/scim+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScimError::from_status(status.as_u16(), message));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_no_body(&self, request: reqwest::RequestBuilder) -> ScimResult<()> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/scim+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScimError::from_status(status.as_u16(), message));
        }
        Ok(())
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&str>,
    ) -> ScimResult<Vec<T>> {
        let mut resources = Vec::new();
        let mut start_index = 1usize;

        loop {
            let mut url = format!(
                "{}?startIndex={start_index}&count={PAGE_SIZE}",
                self.url(path)
            );
            if let Some(filter) = filter {
                url.push_str(&format!("&filter={}", urlencoding::encode(filter)));
            }

            let page: ListResponse<T> = self.send(self.http.get(&url)).await?;
            let fetched = page.resources.len();
            resources.extend(page.resources);

            debug!(path, start_index, fetched, total = page.total_results, "scim page fetched");

            if fetched == 0 || resources.len() >= page.total_results {
                break;
            }
            start_index += fetched;
        }

        Ok(resources)
    }

    /// Enumerate every user of the tenant.
    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: Option<&str>) -> ScimResult<Vec<ScimUser>> {
        self.list("Users", filter).await
    }

    /// Enumerate every group of the tenant.
    #[instrument(skip(self))]
    pub async fn list_groups(&self, filter: Option<&str>) -> ScimResult<Vec<ScimGroup>> {
        self.list("Groups", filter).await
    }

    /// Look a user up by its natural key.
    pub async fn get_user_by_user_name(&self, user_name: &str) -> ScimResult<Option<ScimUser>> {
        let filter = format!("userName eq \"{user_name}\"");
        let mut users = self.list_users(Some(&filter)).await?;
        Ok(if users.is_empty() {
            None
        } else {
            Some(users.swap_remove(0))
        })
    }

    /// Look a group up by its natural key.
    pub async fn get_group_by_display_name(&self, name: &str) -> ScimResult<Option<ScimGroup>> {
        let filter = format!("displayName eq \"{name}\"");
        let mut groups = self.list_groups(Some(&filter)).await?;
        Ok(if groups.is_empty() {
            None
        } else {
            Some(groups.swap_remove(0))
        })
    }

    pub async fn create_user(&self, user: &ScimUser) -> ScimResult<ScimUser> {
        let mut user = user.clone();
        user.schemas = vec![USER_SCHEMA.to_string()];
        self.send(self.http.post(self.url("Users")).json(&user)).await
    }

    pub async fn put_user(&self, id: &str, user: &ScimUser) -> ScimResult<ScimUser> {
        let mut user = user.clone();
        user.schemas = vec![USER_SCHEMA.to_string()];
        user.id = id.to_string();
        self.send(self.http.put(self.url(&format!("Users/{id}"))).json(&user))
            .await
    }

    pub async fn delete_user(&self, id: &str) -> ScimResult<()> {
        self.send_no_body(self.http.delete(self.url(&format!("Users/{id}"))))
            .await
    }

    pub async fn create_group(&self, group: &ScimGroup) -> ScimResult<ScimGroup> {
        let mut group = group.clone();
        group.schemas = vec![GROUP_SCHEMA.to_string()];
        self.send(self.http.post(self.url("Groups")).json(&group))
            .await
    }

    pub async fn delete_group(&self, id: &str) -> ScimResult<()> {
        self.send_no_body(self.http.delete(self.url(&format!("Groups/{id}"))))
            .await
    }

    /// Apply a membership patch to a group. Targets answering 204 are
    /// handled the same as those returning the updated resource.
    pub async fn patch_group(&self, id: &str, patch: &PatchRequest) -> ScimResult<()> {
        self.send_no_body(
            self.http
                .patch(self.url(&format!("Groups/{id}")))
                .json(patch),
        )
        .await
    }
}
