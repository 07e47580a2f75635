use serde::{Deserialize, Serialize};

/// User resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(rename = "role_id", default)]
    pub role_ids: Vec<i64>,
    #[serde(default)]
    pub directory_id: Option<i64>,
    #[serde(default)]
    pub member_of: Option<String>,
    #[serde(default)]
    pub custom_attributes: Option<serde_json::Value>,
    #[serde(default)]
    pub activated_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub invitation_sent_at: Option<String>,
    #[serde(default)]
    pub locked_until: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Role resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Group resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Event resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub event_type_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub actor_user_id: Option<i64>,
    #[serde(default)]
    pub actor_user_name: Option<String>,
    #[serde(default)]
    pub app_id: Option<i64>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub otp_device_id: Option<i64>,
    #[serde(default)]
    pub otp_device_name: Option<String>,
    #[serde(default)]
    pub policy_id: Option<i64>,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub ipaddr: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Event type descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// App entry from the legacy XML embed endpoint.
///
/// Built from XML rather than JSON, so this is a plain value object with
/// no serde wiring; every field is optional because the endpoint only
/// guarantees the fixed element allow-list, not that each element is
/// present for every app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedApp {
    pub id: Option<i64>,
    pub icon: Option<String>,
    pub name: Option<String>,
    pub provisioned: Option<i64>,
    pub extension_required: Option<bool>,
    pub personal: Option<bool>,
    pub login_id: Option<i64>,
}
