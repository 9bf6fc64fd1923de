use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when an activity references an agent missing from the roster.
pub const UNKNOWN_AGENT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    #[serde(default)]
    pub companyname: String,
    #[serde(default)]
    pub contactperson: String,
    #[serde(default)]
    pub referenceid: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub tsm: String,
    #[serde(default)]
    pub typeclient: String,
    #[serde(default)]
    pub typeactivity: String,
    #[serde(default)]
    pub activitystatus: String,
    #[serde(default)]
    pub source: String,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub soamount: f64,
    #[serde(default)]
    pub actualsales: f64,
    #[serde(default)]
    pub targetquota: f64,
    #[serde(default)]
    pub activitynumber: Option<String>,
    #[serde(default)]
    pub callstatus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    SpecialAccess,
    Admin,
    Manager,
    TerritorySalesManager,
    TerritorySalesAssociate,
    Other(String),
}

impl Role {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Super Admin" => Role::SuperAdmin,
            "Special Access" => Role::SpecialAccess,
            "Admin" => Role::Admin,
            "Manager" => Role::Manager,
            "Territory Sales Manager" => Role::TerritorySalesManager,
            "Territory Sales Associate" => Role::TerritorySalesAssociate,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::SpecialAccess => "Special Access",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::TerritorySalesManager => "Territory Sales Manager",
            Role::TerritorySalesAssociate => "Territory Sales Associate",
            Role::Other(label) => label,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the user directory, in the field casing the user endpoints use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "ReferenceID", default)]
    pub reference_id: String,
    #[serde(rename = "Firstname", default)]
    pub firstname: String,
    #[serde(rename = "Lastname", default)]
    pub lastname: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Role", default)]
    pub role: String,
    #[serde(rename = "Department", default)]
    pub department: String,
    #[serde(rename = "Company", default)]
    pub company: String,
    #[serde(rename = "TSM", default)]
    pub tsm: String,
    #[serde(rename = "Manager", default)]
    pub manager: String,
    #[serde(rename = "TargetQuota", default)]
    pub target_quota: f64,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn role(&self) -> Role {
        Role::from_label(&self.role)
    }
}

/// In-memory join of agent reference ids to display names.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    names: HashMap<String, String>,
}

impl AgentDirectory {
    pub fn from_users(users: &[UserRecord]) -> Self {
        let names = users
            .iter()
            .map(|user| (user.reference_id.clone(), user.full_name()))
            .collect();
        Self { names }
    }

    pub fn name_of(&self, reference_id: &str) -> String {
        self.names
            .get(reference_id)
            .cloned()
            .unwrap_or_else(|| format!("{UNKNOWN_AGENT} {UNKNOWN_AGENT}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportMode {
    Mtd,
    Ytd,
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Mtd => f.write_str("MTD"),
            ReportMode::Ytd => f.write_str("YTD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Callback,
    Inquiry,
    FollowUp,
    Other(String),
}

impl NotificationKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Callback Notification" => NotificationKind::Callback,
            "Inquiry Notification" => NotificationKind::Inquiry,
            "Follow-Up Notification" => NotificationKind::FollowUp,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NotificationKind::Callback => "Callback Notification",
            NotificationKind::Inquiry => "Inquiry Notification",
            NotificationKind::FollowUp => "Follow-Up Notification",
            NotificationKind::Other(label) => label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    Read,
    Unread,
}

impl NotificationStatus {
    pub fn from_label(label: &str) -> Self {
        if label == "Read" {
            NotificationStatus::Read
        } else {
            NotificationStatus::Unread
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationStatus::Read => "Read",
            NotificationStatus::Unread => "Unread",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub kind: NotificationKind,
    pub referenceid: String,
    pub tsm: String,
    pub companyname: String,
    pub date_created: Option<DateTime<Utc>>,
    pub callback: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub status: NotificationStatus,
}

impl NotificationRecord {
    /// Callback date when present, otherwise the creation date.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.callback.or(self.date_created)
    }
}

/// Response envelope shared by feeds and mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            inserted_count: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            inserted_count: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn inserted(count: usize) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(format!("{count} records imported successfully!")),
            inserted_count: Some(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(reference_id: &str, first: &str, last: &str) -> UserRecord {
        UserRecord {
            id: format!("id-{reference_id}"),
            reference_id: reference_id.to_string(),
            firstname: first.to_string(),
            lastname: last.to_string(),
            email: String::new(),
            role: "Territory Sales Associate".to_string(),
            department: "Sales".to_string(),
            company: String::new(),
            tsm: String::new(),
            manager: String::new(),
            target_quota: 0.0,
        }
    }

    #[test]
    fn unknown_agents_fall_back_to_placeholder_name() {
        let directory = AgentDirectory::from_users(&[user("AB-NCR-000001", "Ana", "Bautista")]);
        assert_eq!(directory.name_of("AB-NCR-000001"), "Ana Bautista");
        assert_eq!(directory.name_of("missing"), "Unknown Unknown");
    }

    #[test]
    fn user_json_uses_directory_casing() {
        let json = r#"{"_id":"u1","ReferenceID":"R1","Firstname":"Lea","Lastname":"Cruz","Role":"Manager"}"#;
        let parsed: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.reference_id, "R1");
        assert_eq!(parsed.role(), Role::Manager);
        assert_eq!(parsed.target_quota, 0.0);
    }

    #[test]
    fn notification_labels_parse_known_kinds() {
        assert_eq!(
            NotificationKind::from_label("Follow-Up Notification"),
            NotificationKind::FollowUp
        );
        assert_eq!(
            NotificationKind::from_label("Taskflow Notification"),
            NotificationKind::Other("Taskflow Notification".to_string())
        );
        assert_eq!(NotificationStatus::from_label("Read"), NotificationStatus::Read);
        assert_eq!(NotificationStatus::from_label(""), NotificationStatus::Unread);
    }

    #[test]
    fn import_envelope_serializes_inserted_count() {
        let body = serde_json::to_value(ApiResponse::inserted(3)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["insertedCount"], 3);
        assert!(body.get("data").is_none());
    }
}
