use std::hash::{Hash, Hasher};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rigsheet_core::protocol::{
    AckResponse, Action, ActionRequest, CreateResponse, GetResponse, JoinResponse, PollResponse,
    SessionState, StatusResponse, UpdateEvent, UpdateKind, UpdateResponse,
};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::session;
use crate::store::{SessionRecord, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.config.inactivity_window.as_millis()).unwrap_or(i64::MAX)
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.config.session_ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/session", get(session_status).post(collab_action))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

/// Response bodies of the multiplexed endpoint
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ActionReply {
    Created(CreateResponse),
    Joined(JoinResponse),
    Polled(PollResponse),
    Updated(UpdateResponse),
    Fetched(GetResponse),
    Ack(AckResponse),
}

async fn collab_action(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ActionReply>, AppError> {
    // Parse by hand so an unrecognized action surfaces as a structured 400,
    // not a transport-level rejection.
    let request: ActionRequest = serde_json::from_value(payload)
        .map_err(|error| AppError::bad_request(format!("unrecognized request: {error}")))?;
    let now = Utc::now().timestamp_millis();
    dispatch(&state, request, now).map(Json)
}

fn dispatch(state: &AppState, request: ActionRequest, now: i64) -> Result<ActionReply, AppError> {
    match request.action {
        Action::Create => create_session(state, now),
        Action::Join => join_session(state, &request, now),
        Action::Leave => leave_session(state, &request),
        Action::Poll => poll_session(state, &request, now),
        Action::Update => update_session(state, &request, now),
        Action::Get => get_session(state, &request),
        Action::Delete => delete_session(state, &request),
    }
}

fn create_session(state: &AppState, now: i64) -> Result<ActionReply, AppError> {
    let session_id = session::new_session_id();
    let session_state = SessionState {
        last_updated: now,
        ..SessionState::default()
    };
    let record = SessionRecord {
        session_id: session_id.clone(),
        data: serde_json::to_string(&session_state)?,
        created_at: now,
        expires_at: now + state.ttl_ms(),
    };
    state.store.create(&record)?;

    tracing::info!(action = "create", session = %session_id, "Created shared session");
    Ok(ActionReply::Created(CreateResponse {
        success: true,
        share_link: format!("{}/{session_id}", state.config.share_link_base_url),
        session_id,
        expires_at: record.expires_at,
    }))
}

fn join_session(
    state: &AppState,
    request: &ActionRequest,
    now: i64,
) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    let user_id = required_user(request)?;
    let mut session_state = load_session(state, session_id)?;

    session::touch_participant(&mut session_state, user_id, now);
    if let Some(initial_data) = &request.initial_data {
        // First writer after join wins: the seed path overwrites, it does
        // not merge.
        session::set_canonical_data(&mut session_state, initial_data.clone(), now);
    }
    persist(state, session_id, &session_state)?;

    tracing::info!(
        action = "join",
        session = %session_id,
        user = user_fingerprint(user_id),
        seeded = request.initial_data.is_some(),
        participants = session_state.users.len(),
        "Participant joined"
    );
    Ok(ActionReply::Joined(JoinResponse {
        success: true,
        data: session_state.data.clone(),
        participant_count: session_state.users.len(),
    }))
}

fn leave_session(state: &AppState, request: &ActionRequest) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    let user_id = required_user(request)?;

    // Best effort: a vanished session or participant still counts as left.
    if let Some(record) = state.store.load(session_id)? {
        let mut session_state: SessionState = serde_json::from_str(&record.data)?;
        if session::remove_participant(&mut session_state, user_id) {
            persist(state, session_id, &session_state)?;
        }
    }

    tracing::debug!(
        action = "leave",
        session = %session_id,
        user = user_fingerprint(user_id),
        "Participant left"
    );
    Ok(ActionReply::Ack(AckResponse { success: true }))
}

fn poll_session(
    state: &AppState,
    request: &ActionRequest,
    now: i64,
) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    let user_id = required_user(request)?;
    let mut session_state = load_session(state, session_id)?;

    session::touch_participant(&mut session_state, user_id, now);
    session::prune_stale(&mut session_state, now, state.window_ms());
    let updates = session::updates_since(&session_state, request.last_update.unwrap_or(0));
    persist(state, session_id, &session_state)?;

    Ok(ActionReply::Polled(PollResponse {
        success: true,
        updates,
        participant_count: session_state.users.len(),
        server_time: now,
    }))
}

fn update_session(
    state: &AppState,
    request: &ActionRequest,
    now: i64,
) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    let user_id = required_user(request)?;
    let kind = request
        .kind
        .ok_or_else(|| AppError::bad_request("update requires a type"))?;
    let timestamp = request.timestamp.unwrap_or(now);
    let mut session_state = load_session(state, session_id)?;

    let event = match kind {
        UpdateKind::Full => {
            let data = request
                .data
                .as_ref()
                .ok_or_else(|| AppError::bad_request("full update requires data"))?;
            session::set_canonical_data(&mut session_state, data.clone(), now);
            UpdateEvent {
                user_id: user_id.to_string(),
                kind,
                data: Some(data.clone()),
                field: None,
                value: None,
                timestamp,
            }
        }
        // Field events ride the log only; canonical data is left alone and
        // each poller applies them client-side.
        UpdateKind::Field => {
            let field = request
                .field
                .clone()
                .ok_or_else(|| AppError::bad_request("field update requires a field"))?;
            UpdateEvent {
                user_id: user_id.to_string(),
                kind,
                data: None,
                field: Some(field),
                value: request.value.clone(),
                timestamp,
            }
        }
    };
    session::record_update(&mut session_state, event, now, state.window_ms());
    persist(state, session_id, &session_state)?;

    tracing::info!(
        action = "update",
        session = %session_id,
        user = user_fingerprint(user_id),
        kind = ?kind,
        timestamp,
        "Recorded update event"
    );
    Ok(ActionReply::Updated(UpdateResponse {
        success: true,
        timestamp,
    }))
}

fn get_session(state: &AppState, request: &ActionRequest) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    let session_state = load_session(state, session_id)?;

    // Read-only: liveness is untouched, nothing is written back.
    Ok(ActionReply::Fetched(GetResponse {
        success: true,
        data: session_state.data,
        participant_count: session_state.users.len(),
        last_updated: session_state.last_updated,
    }))
}

fn delete_session(state: &AppState, request: &ActionRequest) -> Result<ActionReply, AppError> {
    let session_id = required_session(request)?;
    state.store.delete(session_id)?;
    tracing::info!(action = "delete", session = %session_id, "Deleted session");
    Ok(ActionReply::Ack(AckResponse { success: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusQuery {
    session_id: Option<String>,
}

async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let session_id = query
        .session_id
        .as_deref()
        .ok_or_else(|| AppError::bad_request("sessionId query parameter is required"))?;

    let Some(record) = state.store.load(session_id)? else {
        return Ok(Json(StatusResponse {
            exists: false,
            created_at: None,
            last_updated: None,
            participant_count: 0,
        }));
    };
    let session_state: SessionState = serde_json::from_str(&record.data)?;

    Ok(Json(StatusResponse {
        exists: true,
        created_at: Some(record.created_at),
        last_updated: Some(session_state.last_updated),
        participant_count: session_state.users.len(),
    }))
}

fn required_session(request: &ActionRequest) -> Result<&str, AppError> {
    request
        .session_id
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("sessionId is required"))
}

fn required_user(request: &ActionRequest) -> Result<&str, AppError> {
    request
        .user_id
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("userId is required"))
}

fn load_session(state: &AppState, session_id: &str) -> Result<SessionState, AppError> {
    let record = state
        .store
        .load(session_id)?
        .ok_or_else(|| AppError::not_found(session_id))?;
    Ok(serde_json::from_str(&record.data)?)
}

fn persist(state: &AppState, session_id: &str, session_state: &SessionState) -> Result<(), AppError> {
    let payload = serde_json::to_string(session_state)?;
    state.store.save(session_id, &payload)
}

fn user_fingerprint(user_id: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    user_id.hash(&mut hasher);
    hasher.finish()
}
