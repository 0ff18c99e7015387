//! Collaboration wire protocol.
//!
//! One action-multiplexed POST endpoint carries the whole session lifecycle;
//! a GET variant answers existence/status queries. These types are shared by
//! the client in this crate and the rigsheet-api handler so both sides agree
//! on the JSON shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ReportData;

/// Session identifier length (random alphanumeric symbols)
pub const SESSION_ID_LEN: usize = 8;

/// Protocol action names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Join,
    Leave,
    Poll,
    Update,
    Get,
    Delete,
}

/// Update event flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Carries a whole report payload and rewrites the canonical snapshot
    Full,
    /// Carries one field change; transported via the log only, never replayed
    /// into the canonical snapshot server-side
    Field,
}

/// Request body of the multiplexed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<UpdateKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_data: Option<ReportData>,
}

impl ActionRequest {
    /// Bare request carrying only the action name
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            session_id: None,
            user_id: None,
            data: None,
            kind: None,
            field: None,
            value: None,
            timestamp: None,
            last_update: None,
            initial_data: None,
        }
    }

    /// Attach a session id
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach a user id
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// One participant in a shared session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub id: String,
    pub joined_at: i64,
    pub last_seen: i64,
}

/// One update event in a session's pending log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub timestamp: i64,
}

/// Serialized session payload, opaque to the storage layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub data: Option<ReportData>,
    pub users: HashMap<String, Participant>,
    pub updates: Vec<UpdateEvent>,
    pub last_updated: i64,
}

/// Response to `create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    pub session_id: String,
    pub share_link: String,
    pub expires_at: i64,
}

/// Response to `join`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub success: bool,
    pub data: Option<ReportData>,
    pub participant_count: usize,
}

/// Response to `leave` and `delete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Response to `poll`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub success: bool,
    pub updates: Vec<UpdateEvent>,
    pub participant_count: usize,
    pub server_time: i64,
}

/// Response to `update`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    pub timestamp: i64,
}

/// Response to `get`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    pub success: bool,
    pub data: Option<ReportData>,
    pub participant_count: usize,
    pub last_updated: i64,
}

/// Response to the GET status query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
    pub participant_count: usize,
}

/// Failure body carried by every unsuccessful response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
