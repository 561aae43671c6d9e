//! The thin axum layer: each handler parses its request into the closed
//! `CallEvent`/PMS-webhook union and hands off to the [`SessionManager`]
//! (§3, §6).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use voice_agent_session::parse_call_event;

use crate::auth::{verify_apaleo_webhook, verify_bearer, verify_call_start_jwt};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/call/event", post(call_event))
        .route("/v1/livekit/webhook", post(livekit_webhook))
        .route("/v1/livekit/transcription", post(livekit_transcription))
        .route("/v1/apaleo/webhook", post(apaleo_webhook))
        .route("/v1/call/start", post(call_start))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct CallEventBody {
    event: String,
    room_name: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Serialize)]
struct CallEventResponse {
    status: String,
    event: String,
}

/// `POST /call/event`: bearer-authenticated generic event ingress.
async fn call_event(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<CallEventBody>) -> Response {
    if state.settings.server.auth.enabled {
        let Some(expected) = state.settings.server.auth.livekit_webhook_key.as_deref() else {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "auth not configured"}))).into_response();
        };
        let header = headers.get("authorization").and_then(|v| v.to_str().ok());
        if verify_bearer(header, expected).is_err() {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response();
        }
    }

    let event = parse_call_event(&body.event, &body.room_name, &body.data);
    let reply = state.session_manager.handle_event(event).await;
    (StatusCode::OK, Json(CallEventResponse { status: reply.status, event: body.event })).into_response()
}

/// External LiveKit event names this deployment recognizes, mapped onto the
/// internal `CallEvent` vocabulary. Anything outside this closed set is
/// acknowledged but ignored rather than rejected.
const LIVEKIT_EVENT_NAMES: &[&str] = &[
    "agent_ready",
    "call_started",
    "transcription",
    "intent_detected",
    "response_generated",
    "tts_completed",
    "call_ended",
    "error",
    "dtmf",
];

#[derive(Debug, Deserialize)]
struct LivekitWebhookBody {
    event: String,
    #[serde(default)]
    room_name: String,
    #[serde(default)]
    data: Value,
}

async fn livekit_webhook(State(state): State<AppState>, Json(body): Json<LivekitWebhookBody>) -> Response {
    if !LIVEKIT_EVENT_NAMES.contains(&body.event.as_str()) {
        return Json(json!({"status": "ignored"})).into_response();
    }

    let event = parse_call_event(&body.event, &body.room_name, &body.data);
    let reply = state.session_manager.handle_event(event).await;
    Json(json!({"status": reply.status})).into_response()
}

#[derive(Debug, Deserialize)]
struct LivekitTranscriptionBody {
    room_name: String,
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    is_final: bool,
}

fn default_language() -> String {
    "en".to_string()
}

async fn livekit_transcription(State(state): State<AppState>, Json(body): Json<LivekitTranscriptionBody>) -> Response {
    let event = voice_agent_session::CallEvent::Transcription {
        room_name: body.room_name,
        text: body.text,
        language: body.language,
        confidence: body.confidence,
        is_final: body.is_final,
    };
    let reply = state.session_manager.handle_event(event).await;
    Json(json!({"status": reply.status, "text": reply.text})).into_response()
}

#[derive(Debug, Deserialize)]
struct ApaleoWebhookBody {
    topic: String,
    #[serde(default)]
    #[allow(dead_code)]
    payload: Value,
}

async fn apaleo_webhook(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    raw_body: axum::body::Bytes,
) -> Response {
    let auth = &state.settings.server.auth;
    if auth.enabled {
        let Some(secret) = auth.apaleo_webhook_secret.as_deref() else {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "auth not configured"}))).into_response();
        };
        let signature = headers.get("x-apaleo-signature").and_then(|v| v.to_str().ok());
        if verify_apaleo_webhook(&addr.ip().to_string(), &auth.apaleo_ip_allowlist, &raw_body, signature, secret).is_err() {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response();
        }
    }

    let body: ApaleoWebhookBody = match serde_json::from_slice(&raw_body) {
        Ok(b) => b,
        Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid payload"}))).into_response(),
    };

    match body.topic.as_str() {
        "system/healthcheck" => Json(json!({"status": "ok", "service": "voice-agent"})).into_response(),
        "Reservation/created" | "Reservation/changed" | "Reservation/canceled" => {
            tracing::info!(topic = %body.topic, "received reservation webhook");
            Json(json!({"status": "processed"})).into_response()
        }
        other => Json(json!({"status": "ignored", "reason": format!("unhandled topic: {other}")})).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CallStartBody {
    hotel_id: String,
    #[serde(default)]
    #[allow(dead_code)]
    caller_number: Option<String>,
}

#[derive(Debug, Serialize)]
struct CallStartResponse {
    call_id: String,
    session_token: String,
    media_websocket_url: String,
    region: String,
    encryption_key_id: String,
}

/// `POST /v1/call/start`: JWT-authenticated call provisioning.
async fn call_start(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<CallStartBody>) -> Response {
    let auth = &state.settings.server.auth;
    if auth.enabled {
        let Some(secret) = auth.call_start_jwt_secret.as_deref() else {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "auth not configured"}))).into_response();
        };
        let header = headers.get("authorization").and_then(|v| v.to_str().ok());
        if let Err(e) = verify_call_start_jwt(header, secret) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": e.to_string()}))).into_response();
        }
    }

    let call_id = Uuid::new_v4().to_string();
    let session_token = hex_sha256(&format!("{call_id}:{}", body.hotel_id));
    let region = state.settings.region.clone().unwrap_or_else(|| "eu-west-1".to_string());

    Json(CallStartResponse {
        media_websocket_url: format!("wss://media.voicehive.internal/rooms/{call_id}"),
        encryption_key_id: format!("kms-{region}-default"),
        region,
        call_id,
        session_token,
    })
    .into_response()
}

fn hex_sha256(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
