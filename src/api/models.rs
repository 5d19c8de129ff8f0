//! Request and response schemas for the service desk API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// What a user is allowed to do.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Client,
    Executor,
    Manager,
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Confirmed,
    Blocked,
}

/// Lifecycle of a service request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    New,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// The kind of problem a service request is about.
///
/// Unknown kinds are carried through untouched; the server is the one that
/// decides whether they're acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Plumbing,
    Electricity,
    Elevator,
    Cleaning,
    Heating,
    Other,
    Unrecognized(String),
}

impl RequestType {
    pub fn as_str(&self) -> &str {
        match self {
            RequestType::Plumbing => "plumbing",
            RequestType::Electricity => "electricity",
            RequestType::Elevator => "elevator",
            RequestType::Cleaning => "cleaning",
            RequestType::Heating => "heating",
            RequestType::Other => "other",
            RequestType::Unrecognized(kind) => kind,
        }
    }
}

impl From<&str> for RequestType {
    fn from(value: &str) -> Self {
        match value {
            "plumbing" => RequestType::Plumbing,
            "electricity" => RequestType::Electricity,
            "elevator" => RequestType::Elevator,
            "cleaning" => RequestType::Cleaning,
            "heating" => RequestType::Heating,
            "other" => RequestType::Other,
            kind => RequestType::Unrecognized(kind.to_string()),
        }
    }
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        RequestType::from(value.as_str())
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        match value {
            RequestType::Unrecognized(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(RequestType::from(value))
    }
}

/// The server sends timestamps with an offset (Postgres) or without one
/// (SQLite). Offset-less ones are taken to be UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    fn parse<E: serde::de::Error>(raw: &str) -> Result<DateTime<Utc>, E> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(E::custom)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw)
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse(&raw).map(Some),
                None => Ok(None),
            }
        }
    }
}

// ==================== Auth ====================

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub fullname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The login response. `access_token` is optional so that a response without
/// one is still readable; nothing is stored in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

// ==================== Users ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// A phone number.
    pub username: String,
    pub fullname: String,
    #[serde(default)]
    pub address: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub is_active: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The subset of a user other users may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub fullname: String,
    #[serde(default)]
    pub address: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Everything in [`UserUpdate`], plus the fields only managers and admins touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdateAdmin {
    #[serde(flatten)]
    pub profile: UserUpdate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ==================== Service requests ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub client_id: i64,
    #[serde(default)]
    pub executor_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub description: String,
    pub status: RequestStatus,
    /// 1 = normal, 2 = high, 3 = urgent.
    pub priority: u8,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub deadline: Option<DateTime<Utc>>,
}

/// A service request with its client and executor filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequestDetails {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub client: UserPublic,
    #[serde(default)]
    pub executor: Option<UserPublic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewServiceRequest {
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignExecutor {
    pub executor_id: i64,
}

// ==================== Comments ====================

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub request_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub request_id: i64,
    pub user_id: i64,
    pub text: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: UserPublic,
}

// ==================== Stats & settings ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_requests: u64,
    pub new_requests: u64,
    pub in_progress_requests: u64,
    pub completed_requests: u64,
    pub total_users: u64,
    pub total_clients: u64,
    pub total_executors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingUpdate {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The health check at `/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
