use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::spawn_session_serializer;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::{rand_id, rand_seed};
use crate::use_cases::SessionError;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Default, serde::Deserialize)]
pub struct SessionInitRequest {
    // Omitted ids get a generated one.
    #[serde(default)]
    session_id: Option<String>,
    // Omitted seeds get a random one.
    #[serde(default)]
    seed: Option<u64>,
}

const MAX_SESSION_ID_LEN: usize = 64;

fn valid_session_id(id: &str) -> bool {
    id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, serde::Serialize)]
struct SessionInitResponse {
    session_id: String,
    seed: u64,
}

pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SessionInitRequest>>,
) -> impl IntoResponse {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    let session_id = match payload.session_id {
        Some(id) => id.trim().to_string(),
        None => format!("session-{:x}", rand_id()),
    };
    if session_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session_id must not be blank");
    }
    if !valid_session_id(&session_id) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "session_id may only contain letters, digits, '-' and '_'",
        );
    }
    let seed = payload.seed.unwrap_or_else(rand_seed);

    match state.sessions.create_session(session_id.clone(), seed).await {
        Ok(session) => {
            // Create the serializer so clients can subscribe immediately.
            spawn_session_serializer(&session);
            (
                StatusCode::CREATED,
                Json(SessionInitResponse { session_id, seed }),
            )
                .into_response()
        }
        Err(SessionError::AlreadyExists) => {
            error_response(StatusCode::CONFLICT, "session already exists")
        }
        Err(SessionError::Storage(err)) => {
            error!(session_id = %session_id, error = %err, "failed to load session snapshot");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "session storage unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_an_id_has_path_or_punctuation_characters_then_it_is_invalid() {
        assert!(valid_session_id("arena-1_b"));
        assert!(!valid_session_id("a.b"));
        assert!(!valid_session_id("a/b"));
        assert!(!valid_session_id("../etc"));
        assert!(!valid_session_id(&"x".repeat(MAX_SESSION_ID_LEN + 1)));
    }
}
