//! Data structures for the wire format spoken with the ArcusHR backend.
//!
//! This module defines request and response payloads for authentication,
//! attendance, and leave endpoints, used for data transfer between the
//! client and the remote service. The backend speaks camelCase JSON.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Keys under which session state is cached in the persistent store.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER: &str = "user";

    /// All session keys, in removal order for a full teardown.
    pub const ALL: [&str; 3] = [ACCESS_TOKEN, REFRESH_TOKEN, USER];
}

/// Login request payload
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request payload. Registering creates the company alongside
/// its first (admin) user account.
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// Token refresh request
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response returned by login, register, and refresh.
///
/// The `user` payload is opaque to the client: it is cached and handed back
/// to callers unmodified, never validated or interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: serde_json::Value,
}

/// Attendance actions accepted by the check-in endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

/// Body of a check-in/check-out request.
#[derive(Debug, Serialize)]
pub struct CheckInOutRequest {
    pub action: AttendanceAction,
}

/// Decision applied to a pending leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDecision {
    Approve,
    Reject,
}

/// Body of a leave approval/rejection request.
#[derive(Debug, Serialize)]
pub struct ApproveLeaveRequest {
    pub action: LeaveDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}
