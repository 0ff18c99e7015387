//! In-memory session-state operations.
//!
//! Every protocol action loads a [`SessionState`], runs one or more of these
//! functions against it with the current wall-clock time, and writes the
//! whole payload back. Keeping the operations pure over an injected `now`
//! lets the tests drive liveness pruning and log expiry with synthetic
//! timestamps.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use rigsheet_core::models::ReportData;
use rigsheet_core::protocol::{Participant, SessionState, UpdateEvent, SESSION_ID_LEN};

/// Mint a new session identifier: 8 random alphanumeric symbols
pub fn new_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Register the caller as a participant, or refresh their liveness
pub fn touch_participant(state: &mut SessionState, user_id: &str, now: i64) {
    let participant = state
        .users
        .entry(user_id.to_string())
        .or_insert_with(|| Participant {
            id: user_id.to_string(),
            joined_at: now,
            last_seen: now,
        });
    participant.last_seen = now;
}

/// Remove the caller from the roster; absence is a no-op
pub fn remove_participant(state: &mut SessionState, user_id: &str) -> bool {
    state.users.remove(user_id).is_some()
}

/// Overwrite the canonical payload and bump the last-updated time.
///
/// This is both the `join` seed path (first writer after join wins) and the
/// full-update path.
pub fn set_canonical_data(state: &mut SessionState, data: ReportData, now: i64) {
    state.data = Some(data);
    state.last_updated = now;
}

/// Append an update event and trim the log to the inactivity window
pub fn record_update(state: &mut SessionState, event: UpdateEvent, now: i64, window_ms: i64) {
    state.updates.push(event);
    trim_update_log(state, now, window_ms);
}

/// Drop participants unseen for longer than the window, and log entries older
/// than it
pub fn prune_stale(state: &mut SessionState, now: i64, window_ms: i64) {
    state
        .users
        .retain(|_, participant| now - participant.last_seen <= window_ms);
    trim_update_log(state, now, window_ms);
}

/// Update-log entries strictly newer than the caller's cursor
pub fn updates_since(state: &SessionState, last_update: i64) -> Vec<UpdateEvent> {
    state
        .updates
        .iter()
        .filter(|event| event.timestamp > last_update)
        .cloned()
        .collect()
}

fn trim_update_log(state: &mut SessionState, now: i64, window_ms: i64) {
    state
        .updates
        .retain(|event| now - event.timestamp <= window_ms);
}
