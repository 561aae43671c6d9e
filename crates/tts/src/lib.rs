//! Synthesizes a text response via the collaborator TTS router, with a
//! classified retry policy and a non-fatal failure outcome (§4.6).

pub mod language;

use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use voice_agent_config::constants::{timeouts, tts_retry};

const MAX_ATTEMPTS: u32 = tts_retry::MAX_ATTEMPTS;
const BASE_BACKOFF: Duration = Duration::from_millis(tts_retry::BASE_BACKOFF_MS);
const MAX_BACKOFF: Duration = Duration::from_millis(tts_retry::MAX_BACKOFF_MS);
const REQUEST_TIMEOUT: Duration = Duration::from_millis(timeouts::TTS_MS);
const DEFAULT_SPEED: f32 = 1.0;
const DEFAULT_FORMAT: &str = "mp3";
const DEFAULT_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Clone)]
pub struct TtsArtifact {
    pub audio_base64: String,
    pub engine_used: String,
    pub voice_used: String,
    pub duration_ms: u64,
    pub cached: bool,
    pub processing_time_ms: u64,
}

/// A TTS failure is an expected, non-fatal outcome the caller always has a
/// defined branch for (play a silence/apology tone), not an error to
/// propagate up the call stack.
#[derive(Debug, Clone)]
pub enum TtsOutcome {
    Synthesized(TtsArtifact),
    NotSynthesized,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_id: Option<&'a str>,
    speed: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion: Option<&'a str>,
    format: &'a str,
    sample_rate: u32,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    audio_data: String,
    engine_used: String,
    voice_used: String,
    duration_ms: u64,
    processing_time_ms: u64,
    #[serde(default)]
    cached: bool,
}

enum AttemptOutcome {
    Success(TtsArtifact),
    Retryable,
    Fatal,
}

pub struct TtsCoordinator {
    client: Client,
    router_url: String,
}

impl TtsCoordinator {
    pub fn new(router_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, router_url: router_url.into() })
    }

    pub async fn synthesize(&self, text: &str, language: &str) -> TtsOutcome {
        let locale = language::resolve_locale(language);
        let started = Instant::now();
        let mut backoff = BASE_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(text, &locale).await {
                AttemptOutcome::Success(mut artifact) => {
                    artifact.processing_time_ms = started.elapsed().as_millis() as u64;
                    return TtsOutcome::Synthesized(artifact);
                }
                AttemptOutcome::Fatal => {
                    tracing::warn!(locale = %locale, "tts request failed with a non-retryable error");
                    return TtsOutcome::NotSynthesized;
                }
                AttemptOutcome::Retryable => {
                    if attempt == MAX_ATTEMPTS {
                        tracing::warn!(locale = %locale, attempts = attempt, "tts request exhausted retries");
                        return TtsOutcome::NotSynthesized;
                    }
                    let jitter_ms = rand::thread_rng().gen_range(0..=backoff.as_millis() as u64);
                    tokio::time::sleep(backoff + Duration::from_millis(jitter_ms)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        TtsOutcome::NotSynthesized
    }

    async fn attempt(&self, text: &str, locale: &str) -> AttemptOutcome {
        let request = SynthesizeRequest {
            text,
            language: locale,
            voice_id: None,
            speed: DEFAULT_SPEED,
            emotion: None,
            format: DEFAULT_FORMAT,
            sample_rate: DEFAULT_SAMPLE_RATE,
        };
        let response = match self.client.post(&self.router_url).json(&request).send().await {
            Ok(r) => r,
            Err(_) => return AttemptOutcome::Retryable,
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<SynthesizeResponse>().await {
                Ok(body) => AttemptOutcome::Success(TtsArtifact {
                    audio_base64: body.audio_data,
                    engine_used: body.engine_used,
                    voice_used: body.voice_used,
                    duration_ms: body.duration_ms,
                    cached: body.cached,
                    processing_time_ms: body.processing_time_ms,
                }),
                Err(_) => AttemptOutcome::Retryable,
            };
        }

        if is_retryable_status(status) {
            AttemptOutcome::Retryable
        } else {
            AttemptOutcome::Fatal
        }
    }
}

/// 5xx, 408 (request timeout) and 429 (rate limited) are retried; any other
/// 4xx is treated as a permanent client error.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn server_error_is_retryable() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
    }

    #[test]
    fn other_client_errors_are_not_retryable() {
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn successful_response_is_synthesized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audio_data": "YWJj",
                "engine_used": "router-default",
                "voice_used": "en-US-standard",
                "duration_ms": 1200,
                "processing_time_ms": 80,
                "cached": false,
            })))
            .mount(&server)
            .await;

        let coordinator = TtsCoordinator::new(server.uri()).unwrap();
        match coordinator.synthesize("hello", "en").await {
            TtsOutcome::Synthesized(artifact) => assert_eq!(artifact.audio_base64, "YWJj"),
            TtsOutcome::NotSynthesized => panic!("expected synthesis to succeed"),
        }
    }

    #[tokio::test]
    async fn non_retryable_status_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let coordinator = TtsCoordinator::new(server.uri()).unwrap();
        assert!(matches!(coordinator.synthesize("hello", "en").await, TtsOutcome::NotSynthesized));
    }
}
