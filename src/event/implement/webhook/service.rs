use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};
use serde_json::Value as JsonValue;
use tracing::Instrument;

use crate::{
    event::{
        implement::webhook::WebHookServiceApp,
        model::{Event, EventKind},
    },
    statics::{HEADER_EVENT, HEADER_REQUEST_ID, HEADER_TOKEN},
};

/// Why a delivery was refused before reaching any handler.
#[derive(Debug)]
pub enum Rejection {
    MissingToken,
    InvalidToken,
    MalformedPayload(serde_json::Error),
    /// The body is valid JSON but not an object.
    NotAnObject,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload(_) | Self::NotAnObject => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "missing {HEADER_TOKEN}"),
            Self::InvalidToken => write!(f, "invalid {HEADER_TOKEN}"),
            Self::MalformedPayload(err) => write!(f, "malformed payload: {err}"),
            Self::NotAnObject => write!(f, "payload is not a json object"),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

pub async fn event_listen_service(
    State(app): State<WebHookServiceApp>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, Rejection> {
    process(&app, &headers, &body).await
}

pub(super) async fn process(
    app: &WebHookServiceApp,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<StatusCode, Rejection> {
    let request_id = headers
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok());
    let event_header = headers
        .get(HEADER_EVENT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()));
    let span = tracing::info_span!(
        "webhook",
        request_id = request_id.unwrap_or("-"),
        event = event_header.as_deref().unwrap_or("-"),
    );
    async move {
        let token = headers.get(HEADER_TOKEN).ok_or_else(|| {
            tracing::warn!("no {HEADER_TOKEN}");
            Rejection::MissingToken
        })?;
        if !crate::utils::verify_token(&app.verification_token, token.as_bytes()) {
            tracing::warn!("{HEADER_TOKEN} mismatch");
            return Err(Rejection::InvalidToken);
        }

        let payload = parse_payload(body).inspect_err(|e| {
            tracing::debug!(%e, "rejecting payload");
        })?;

        let Some(event_header) = event_header else {
            tracing::warn!("no {HEADER_EVENT}, ignoring delivery");
            return Ok(StatusCode::NO_CONTENT);
        };
        let kind = match event_header.parse::<EventKind>() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::info!(%e, "ignoring delivery");
                return Ok(StatusCode::NO_CONTENT);
            }
        };

        let mut event = Event::new(kind, payload);
        if let Some(request_id) = request_id {
            event = event.with_request_id(request_id);
        }
        tracing::info!("event inbound");
        let outcome = app.registry.dispatch(event).await;
        if outcome.is_failed() {
            Ok(app.config.handler_failure.status())
        } else {
            Ok(StatusCode::NO_CONTENT)
        }
    }
    .instrument(span)
    .await
}

/// An empty body is read as `{}`.
fn parse_payload(body: &[u8]) -> Result<JsonValue, Rejection> {
    if body.is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }
    let payload: JsonValue = serde_json::from_slice(body).map_err(Rejection::MalformedPayload)?;
    if payload.is_object() {
        Ok(payload)
    } else {
        Err(Rejection::NotAnObject)
    }
}
