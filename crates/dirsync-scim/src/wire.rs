//! SCIM 2.0 wire types, scoped to what group/user provisioning needs.

use serde::{Deserialize, Serialize};

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const PATCH_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// SCIM user resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    pub user_name: String,
    #[serde(default)]
    pub name: ScimName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ScimEmail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub given_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScimEmail {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub primary: bool,
}

impl ScimEmail {
    pub fn primary_work(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: "work".to_string(),
            primary: true,
        }
    }
}

/// SCIM group resource. Standard SCIM carries the membership inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ScimGroupMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScimGroupMember {
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display: String,
}

/// Paged list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "startIndex", default)]
    pub start_index: usize,
    #[serde(rename = "itemsPerPage", default)]
    pub items_per_page: usize,
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

/// PATCH request body.
#[derive(Debug, Clone, Serialize)]
pub struct PatchRequest {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub value: serde_json::Value,
}

impl PatchRequest {
    /// PATCH adding the given member ids to a group.
    pub fn add_members(member_ids: &[String]) -> Self {
        Self::members_op("add", member_ids)
    }

    /// PATCH removing the given member ids from a group.
    pub fn remove_members(member_ids: &[String]) -> Self {
        Self::members_op("remove", member_ids)
    }

    fn members_op(op: &str, member_ids: &[String]) -> Self {
        let value = member_ids
            .iter()
            .map(|id| serde_json::json!({ "value": id }))
            .collect::<Vec<_>>();
        Self {
            schemas: vec![PATCH_SCHEMA.to_string()],
            operations: vec![PatchOperation {
                op: op.to_string(),
                path: Some("members".to_string()),
                value: serde_json::Value::Array(value),
            }],
        }
    }
}
