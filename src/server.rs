use std::{sync::Arc, time::Duration};

use axum::{
    Form,
    Json,
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use bon::Builder;
use http::{StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tokio::time::timeout;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    api::Messenger,
    clock::Clock,
    hours::{RoutingDecision, WeeklyWindow},
    prelude::*,
    twiml::{Record, VoiceResponse},
};

const TRANSCRIPT_SENT: &str = "The SMS with the voice recording transcript was sent successfully.";
const TRANSCRIPT_NOT_SENT: &str =
    "Something went wrong sending the SMS with the voice recording transcript.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Must stay below [`REQUEST_TIMEOUT`], so that the relay still answers on its own.
const RELAY_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Builder)]
pub struct AppState {
    window: WeeklyWindow,
    clock: Arc<dyn Clock>,
    messenger: Arc<dyn Messenger>,
    record: Record,

    #[builder(into)]
    forward_number: String,

    #[builder(into)]
    sms_from_number: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(route_call))
        .route("/sms", post(relay_transcript))
        .with_state(Arc::new(state))
        .layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT),
        ))
}

#[instrument(skip_all)]
async fn route_call(State(state): State<Arc<AppState>>) -> Response {
    let now = state.clock.now();
    let decision = state.window.decide(&now);
    info!(%now, %decision, "routing the call…");

    let voice_response = match decision {
        RoutingDecision::Forward => VoiceResponse::forward(&state.forward_number),
        RoutingDecision::Voicemail => VoiceResponse::voicemail(&state.record),
    };
    match voice_response.render() {
        Ok(markup) => ([(CONTENT_TYPE, "application/xml")], markup).into_response(),
        Err(error) => {
            error!("failed to render the voice response: {error:#}");
            bad_request(&format!("could not route the call. reason: {error:#}"))
        }
    }
}

/// JSON:API error document.
fn bad_request(detail: &str) -> Response {
    let status = StatusCode::BAD_REQUEST;
    let document = json!({
        "errors": [{
            "status": status.as_u16(),
            "code": status.as_u16().to_string(),
            "title": "Something went wrong",
            "detail": detail,
        }],
    });
    (status, Json(document)).into_response()
}

/// Form posted by the provider once a recording is transcribed.
#[derive(Deserialize)]
struct TranscriptionCallback {
    #[serde(rename = "From", alias = "from", default)]
    from: String,

    #[serde(rename = "TranscriptionText", alias = "transcription_text", default)]
    transcription_text: String,

    /// `completed` or `failed`.
    #[serde(rename = "TranscriptionStatus", alias = "transcription_status", default)]
    transcription_status: Option<String>,
}

impl TranscriptionCallback {
    fn has_transcript(&self) -> bool {
        self.transcription_status.as_deref() != Some("failed")
            && !self.transcription_text.trim().is_empty()
    }
}

#[instrument(skip_all)]
async fn relay_transcript(
    State(state): State<Arc<AppState>>,
    Form(callback): Form<TranscriptionCallback>,
) -> (StatusCode, &'static str) {
    if !callback.has_transcript() {
        warn!(
            caller = %callback.from,
            status = ?callback.transcription_status,
            "no transcript to relay",
        );
        return (StatusCode::OK, TRANSCRIPT_NOT_SENT);
    }

    let from = state.sms_from_number.as_deref().unwrap_or(&callback.from);
    info!(caller = %callback.from, from, "relaying the transcript…");
    let sent = timeout(
        RELAY_TIMEOUT,
        state.messenger.send_text(&state.forward_number, from, &callback.transcription_text),
    )
    .await
    .unwrap_or_else(|_| Err(anyhow::anyhow!("timed out after {RELAY_TIMEOUT:?}")));
    match sent {
        Ok(status) if status.is_failure() => {
            warn!(?status, "the transcript was not delivered");
            (StatusCode::OK, TRANSCRIPT_NOT_SENT)
        }
        Ok(status) => {
            info!(?status, "relayed the transcript");
            (StatusCode::OK, TRANSCRIPT_SENT)
        }
        Err(error) => {
            error!("failed to send the transcript: {error:#}");
            (StatusCode::BAD_GATEWAY, TRANSCRIPT_NOT_SENT)
        }
    }
}
