//! Integration tests for the directory client and token source against a
//! mock endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use dirsync_gws::{
    DirectoryApi, DirectoryClient, GwsError, GwsResult, ServiceAccountKey, TokenProvider,
    TokenSource,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> GwsResult<String> {
        Ok("static-token".to_string())
    }
}

fn client(server: &MockServer) -> DirectoryClient {
    DirectoryClient::new(Arc::new(StaticToken))
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn list_groups_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .and(query_param("pageToken", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{ "id": "g2", "name": "ops", "email": "ops@corp.com" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{ "id": "g1", "name": "eng", "email": "eng@corp.com" }],
            "nextPageToken": "tok-2"
        })))
        .mount(&server)
        .await;

    let groups = client(&server).list_groups(&[]).await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "eng");
    assert_eq!(groups[1].name, "ops");
}

#[tokio::test]
async fn list_users_runs_one_pass_per_query_and_deduplicates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("query", "orgUnitPath=/eng"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "id": "u1", "primaryEmail": "a@corp.com" },
                { "id": "u2", "primaryEmail": "b@corp.com" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("query", "orgUnitPath=/ops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "id": "u2", "primaryEmail": "b@corp.com" },
                { "id": "u3", "primaryEmail": "c@corp.com" }
            ]
        })))
        .mount(&server)
        .await;

    let users = client(&server)
        .list_users(&["orgUnitPath=/eng".to_string(), "orgUnitPath=/ops".to_string()])
        .await
        .unwrap();

    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn member_listing_requests_transitive_expansion() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/g1/members"))
        .and(query_param("includeDerivedMembership", "true"))
        .and(header("Authorization", "Bearer static-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [
                { "id": "u1", "email": "a@corp.com", "type": "USER", "status": "ACTIVE" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let members = client(&server).list_group_members("g1", true).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn empty_group_id_fails_before_any_request() {
    let server = MockServer::start().await;
    let err = client(&server).list_group_members("", true).await.unwrap_err();
    assert!(matches!(err, GwsError::GroupIdEmpty));
}

#[tokio::test]
async fn token_source_exchanges_an_assertion_and_caches_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("jwt-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "granted-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key_document = json!({
        "type": "service_account",
        "client_email": "sync@project.iam.gserviceaccount.com",
        "private_key_id": "kid-1",
        "private_key": include_str!("data/test_key.pem"),
        "token_uri": format!("{}/token", server.uri())
    });

    let key = ServiceAccountKey::from_json(key_document.to_string().as_bytes()).unwrap();
    let source = TokenSource::new(key, "admin@corp.com").unwrap();

    assert_eq!(source.token().await.unwrap(), "granted-token");
    // Second call must come from the cache: the mock expects exactly one hit.
    assert_eq!(source.token().await.unwrap(), "granted-token");
}
