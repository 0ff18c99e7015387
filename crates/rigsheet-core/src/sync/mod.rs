//! Collaboration protocol client.
//!
//! Thin reqwest wrapper over the action-multiplexed endpoint. Everything the
//! server returns goes through the merge engine (or the remote-field apply
//! path) before it touches local state; the client never writes server data
//! into a [`LocalReport`] directly.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::ReportData;
use crate::protocol::{
    AckResponse, Action, ActionRequest, CreateResponse, ErrorResponse, GetResponse, JoinResponse,
    PollResponse, StatusResponse, UpdateEvent, UpdateKind, UpdateResponse,
};
use crate::store::LocalReport;

/// Client for one user against one collaboration endpoint
#[derive(Clone)]
pub struct CollabClient {
    endpoint: String,
    user_id: String,
    client: reqwest::Client,
}

impl CollabClient {
    /// Create a client for the given endpoint and user identifier
    pub fn new(endpoint: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id must not be empty".to_string()));
        }
        Ok(Self {
            endpoint,
            user_id,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Mint a new shared session
    pub async fn create(&self) -> Result<CreateResponse> {
        self.send(&ActionRequest::new(Action::Create).with_user(&self.user_id))
            .await
    }

    /// Join a session, optionally seeding it with initial data.
    ///
    /// A supplied `initial_data` unconditionally overwrites the session's
    /// canonical payload; first writer after join wins.
    pub async fn join(
        &self,
        session_id: &str,
        initial_data: Option<ReportData>,
    ) -> Result<JoinResponse> {
        let mut request = ActionRequest::new(Action::Join)
            .with_session(session_id)
            .with_user(&self.user_id);
        request.initial_data = initial_data;
        self.send(&request).await
    }

    /// Best-effort removal from the participant roster
    pub async fn leave(&self, session_id: &str) -> Result<AckResponse> {
        self.send(
            &ActionRequest::new(Action::Leave)
                .with_session(session_id)
                .with_user(&self.user_id),
        )
        .await
    }

    /// Fetch update events newer than `last_update` and refresh liveness
    pub async fn poll(&self, session_id: &str, last_update: i64) -> Result<PollResponse> {
        let mut request = ActionRequest::new(Action::Poll)
            .with_session(session_id)
            .with_user(&self.user_id);
        request.last_update = Some(last_update);
        self.send(&request).await
    }

    /// Push the whole report payload, rewriting the canonical snapshot
    pub async fn push_full(&self, session_id: &str, data: &ReportData) -> Result<UpdateResponse> {
        let mut request = ActionRequest::new(Action::Update)
            .with_session(session_id)
            .with_user(&self.user_id);
        request.kind = Some(UpdateKind::Full);
        request.data = Some(data.clone());
        self.send(&request).await
    }

    /// Push one field change; logged for other pollers, canonical data
    /// untouched
    pub async fn push_field(
        &self,
        session_id: &str,
        field: &str,
        value: Value,
    ) -> Result<UpdateResponse> {
        let mut request = ActionRequest::new(Action::Update)
            .with_session(session_id)
            .with_user(&self.user_id);
        request.kind = Some(UpdateKind::Field);
        request.field = Some(field.to_string());
        request.value = Some(value);
        self.send(&request).await
    }

    /// Fetch the canonical payload without touching liveness
    pub async fn get(&self, session_id: &str) -> Result<GetResponse> {
        self.send(&ActionRequest::new(Action::Get).with_session(session_id))
            .await
    }

    /// Destroy a session; succeeds even if it is already gone
    pub async fn delete(&self, session_id: &str) -> Result<AckResponse> {
        self.send(&ActionRequest::new(Action::Delete).with_session(session_id))
            .await
    }

    /// Existence/metadata query, no join required
    pub async fn status(&self, session_id: &str) -> Result<StatusResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("sessionId", session_id)])
            .send()
            .await?;
        decode(response).await
    }

    async fn send<T: DeserializeOwned>(&self, request: &ActionRequest) -> Result<T> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Collab(parse_api_error(status, &body)));
    }
    Ok(response.json::<T>().await?)
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorResponse>(body) {
        return format!("{} ({})", payload.error.trim(), status.as_u16());
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(Error::InvalidInput(
            "endpoint must not be empty".to_string(),
        ));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}

/// Apply polled update events to local state.
///
/// Events authored by `own_user_id` are skipped. Full events run through the
/// timestamp-authoritative merge with the event's timestamp as the server
/// time, so a late-arriving payload cannot clobber a newer local edit; field
/// events apply by dotted path. Returns whether anything changed.
pub fn apply_updates(local: &mut LocalReport, updates: &[UpdateEvent], own_user_id: &str) -> bool {
    let mut changed = false;

    for event in updates {
        if event.user_id == own_user_id {
            continue;
        }
        match event.kind {
            UpdateKind::Full => {
                if let Some(data) = &event.data {
                    changed |= local.accept_server(data, event.timestamp).changed();
                }
            }
            UpdateKind::Field => {
                if let (Some(field), Some(value)) = (&event.field, &event.value) {
                    changed |= local.apply_remote_field(field, value);
                }
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn full_event(user_id: &str, tag: &str, timestamp: i64) -> UpdateEvent {
        let mut data = ReportData::default();
        data.inspection.tag = tag.to_string();
        UpdateEvent {
            user_id: user_id.to_string(),
            kind: UpdateKind::Full,
            data: Some(data),
            field: None,
            value: None,
            timestamp,
        }
    }

    fn field_event(user_id: &str, field: &str, value: Value, timestamp: i64) -> UpdateEvent {
        UpdateEvent {
            user_id: user_id.to_string(),
            kind: UpdateKind::Field,
            data: None,
            field: Some(field.to_string()),
            value: Some(value),
            timestamp,
        }
    }

    #[test]
    fn normalize_endpoint_rejects_invalid_values() {
        assert!(normalize_endpoint(String::new()).is_err());
        assert!(normalize_endpoint("api.example.com".to_string()).is_err());
        assert_eq!(
            normalize_endpoint("https://api.example.com/v1/session/".to_string()).unwrap(),
            "https://api.example.com/v1/session"
        );
    }

    #[test]
    fn own_events_are_skipped() {
        let mut local = LocalReport::with_clock(|| 1_000);
        let updates = vec![field_event("me", "inspection.tag", json!("mine"), 2_000)];
        assert!(!apply_updates(&mut local, &updates, "me"));
        assert!(local.data().inspection.tag.is_empty());
    }

    #[test]
    fn field_events_apply_by_path() {
        let mut local = LocalReport::with_clock(|| 1_000);
        let updates = vec![
            field_event("peer", "inspection.tag", json!("T-1"), 2_000),
            field_event("peer", "conclusion", json!("done"), 2_001),
        ];
        assert!(apply_updates(&mut local, &updates, "me"));
        assert_eq!(local.data().inspection.tag, "T-1");
        assert_eq!(local.data().conclusion, "done");
    }

    #[test]
    fn full_events_respect_local_authority() {
        let mut local = LocalReport::with_clock(|| 5_000);
        local.set_field("tag", "newer local");

        let updates = vec![full_event("peer", "older server", 1_000)];
        assert!(!apply_updates(&mut local, &updates, "me"));
        assert_eq!(local.data().inspection.tag, "newer local");

        let updates = vec![full_event("peer", "newer server", 9_000)];
        assert!(apply_updates(&mut local, &updates, "me"));
        assert_eq!(local.data().inspection.tag, "newer server");
    }

    #[test]
    fn malformed_events_are_skipped() {
        let mut local = LocalReport::with_clock(|| 1_000);
        let updates = vec![
            UpdateEvent {
                user_id: "peer".to_string(),
                kind: UpdateKind::Field,
                data: None,
                field: None,
                value: None,
                timestamp: 2_000,
            },
            UpdateEvent {
                user_id: "peer".to_string(),
                kind: UpdateKind::Full,
                data: None,
                field: None,
                value: None,
                timestamp: 2_000,
            },
        ];
        assert!(!apply_updates(&mut local, &updates, "me"));
    }

    #[test]
    fn parse_api_error_prefers_structured_body() {
        let message = parse_api_error(
            StatusCode::NOT_FOUND,
            r#"{"success":false,"error":"Session not found"}"#,
        );
        assert_eq!(message, "Session not found (404)");

        let message = parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(message, "HTTP 500");
    }
}
