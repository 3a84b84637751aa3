//! Domain entities - rows of the platform schema
//!
//! Every entity is a plain relational row; references between entities
//! (`sector_id`, `created_by`, ...) are weak: stored identifiers without
//! ownership or cascade-delete semantics. Enumerated columns are carried
//! as TEXT in storage and mirrored by typed enums here.

use crate::{Error, Result, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Account role - the sole authorization signal on the platform.
///
/// Roles are mutable via self-service switch; there is no permission
/// matrix beyond "which dashboard does this account see".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administration: user management, SQL console
    Admin,
    /// Primary audience: sector connections, events, forums
    Farmer,
    /// Agricultural experts publishing resources and advice
    Expert,
    /// Read-mostly public portal visitors
    Public,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Farmer => "farmer",
            Role::Expert => "expert",
            Role::Public => "public",
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Farmer, Role::Expert, Role::Public]
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "farmer" => Ok(Role::Farmer),
            "expert" => Ok(Role::Expert),
            "public" => Ok(Role::Public),
            _ => Err(Error::Validation(format!("Unknown role: {}", s))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which viewer a resource attachment opens in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Document,
    Video,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Document => "document",
            FileType::Video => "video",
        }
    }

    /// Pick a viewer from a file name extension
    pub fn from_file_name(name: &str) -> Self {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "mp4" | "webm" | "mov" | "mkv" => FileType::Video,
            _ => FileType::Document,
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "document" => Ok(FileType::Document),
            "video" => Ok(FileType::Video),
            _ => Err(Error::Validation(format!("Unknown file type: {}", s))),
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a farmer/sector partnership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Approved,
    InDiscussion,
    Declined,
    Active,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Approved => "approved",
            ConnectionStatus::InDiscussion => "in_discussion",
            ConnectionStatus::Declined => "declined",
            ConnectionStatus::Active => "active",
        }
    }

    pub fn all() -> &'static [ConnectionStatus] {
        &[
            ConnectionStatus::Pending,
            ConnectionStatus::Approved,
            ConnectionStatus::InDiscussion,
            ConnectionStatus::Declined,
            ConnectionStatus::Active,
        ]
    }
}

impl FromStr for ConnectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ConnectionStatus::Pending),
            "approved" => Ok(ConnectionStatus::Approved),
            "in_discussion" => Ok(ConnectionStatus::InDiscussion),
            "declined" => Ok(ConnectionStatus::Declined),
            "active" => Ok(ConnectionStatus::Active),
            _ => Err(Error::Validation(format!("Unknown connection status: {}", s))),
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity/urgency tag on a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
    Reminder,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
            NotificationLevel::Reminder => "reminder",
        }
    }
}

impl FromStr for NotificationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "info" => Ok(NotificationLevel::Info),
            "success" => Ok(NotificationLevel::Success),
            "warning" => Ok(NotificationLevel::Warning),
            "error" => Ok(NotificationLevel::Error),
            "reminder" => Ok(NotificationLevel::Reminder),
            _ => Err(Error::Validation(format!("Unknown notification level: {}", s))),
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decode a row map into a typed entity.
///
/// Extra joined columns (e.g. `author_name`) are captured by the struct
/// when it declares them and ignored otherwise.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| Error::Statement(format!("row decode failed: {}", e)))
}

/// A platform account. `password` holds a bcrypt hash, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// The shape handed to sessions and rendered in profile views -
    /// everything except the credential hash.
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            location: self.location,
            organization: self.organization,
            avatar: self.avatar,
        }
    }
}

/// Session-safe account view (no credential material)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A partner organization in some agricultural sector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    pub name: String,
    /// Free-text category ("Finance", "Logistics", ...)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A scheduled community event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sector_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    // Joined columns
    #[serde(default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
}

/// A discussion forum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    // Joined columns
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub replies: Option<i64>,
}

/// A post inside a forum thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: i64,
    pub forum_id: i64,
    pub author_id: i64,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// A shared knowledge resource.
///
/// Carries either an external `link`, an uploaded `file_name` +
/// `file_blob` (base64 payload), or neither; `file_type` tags which
/// viewer opens the attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_blob: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileType>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// A farmer's partnership with a sector organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorConnection {
    pub id: i64,
    pub user_id: i64,
    pub sector_id: i64,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub sector_name: Option<String>,
    #[serde(default)]
    pub sector_type: Option<String>,
}

/// A targeted or broadcast notification. `user_id` of `None` means
/// "broadcast to every account".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Published editorial content shown on the public portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_roundtrip() {
        for role in Role::all() {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(*role, parsed);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_connection_status_roundtrip() {
        for status in ConnectionStatus::all() {
            let parsed: ConnectionStatus = status.as_str().parse().unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn test_file_type_from_name() {
        assert_eq!(FileType::from_file_name("clip.MP4"), FileType::Video);
        assert_eq!(FileType::from_file_name("guide.pdf"), FileType::Document);
        assert_eq!(FileType::from_file_name("noext"), FileType::Document);
    }

    #[test]
    fn test_user_from_row() {
        let row = json!({
            "id": 2,
            "name": "Ravi Kumar",
            "email": "ravi@agriconnect.in",
            "password": "$2b$10$abcdefghijklmnopqrstuv",
            "role": "farmer",
            "location": "Pune",
            "organization": null,
            "created_at": "2024-01-01T00:00:00Z"
        });
        let Value::Object(map) = row else { unreachable!() };
        let user: User = from_row(map).unwrap();
        assert_eq!(user.role, Role::Farmer);
        assert_eq!(user.location.as_deref(), Some("Pune"));
        assert!(user.organization.is_none());

        let profile = user.into_profile();
        assert_eq!(profile.name, "Ravi Kumar");
    }

    #[test]
    fn test_event_ignores_missing_joins() {
        let row = json!({
            "id": 1,
            "name": "Organic Farming Workshop",
            "start_date": "2024-02-15T09:00:00Z"
        });
        let Value::Object(map) = row else { unreachable!() };
        let event: Event = from_row(map).unwrap();
        assert!(event.sector_name.is_none());
        assert!(event.end_date.is_none());
    }

    #[test]
    fn test_sector_type_column_name() {
        let row = json!({ "id": 1, "name": "AgroBank", "type": "Finance" });
        let Value::Object(map) = row else { unreachable!() };
        let sector: Sector = from_row(map).unwrap();
        assert_eq!(sector.kind, "Finance");
    }
}
