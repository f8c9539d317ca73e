//! Admin SDK Directory wire types, scoped to what the sync needs.

use serde::Deserialize;

/// Member entries of this kind are themselves groups; their human members
/// arrive through transitive expansion instead.
pub const MEMBER_TYPE_GROUP: &str = "GROUP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsUserName {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsUser {
    pub id: String,
    pub primary_email: String,
    #[serde(default)]
    pub name: GwsUserName,
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsMember {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsUsersPage {
    #[serde(default)]
    pub users: Vec<GwsUser>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsGroupsPage {
    #[serde(default)]
    pub groups: Vec<GwsGroup>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GwsMembersPage {
    #[serde(default)]
    pub members: Vec<GwsMember>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
