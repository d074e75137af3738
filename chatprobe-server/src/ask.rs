use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chatprobe_core::{ArtifactSink, AskOutcome, AskRequest};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub html: String,
    pub original_answer: String,
    pub selectors: SelectorSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSummary {
    pub tested: bool,
    pub successful: bool,
    /// `"unknown"` when nothing matched.
    pub selector_used: String,
}

impl From<AskOutcome> for AskResponse {
    fn from(outcome: AskOutcome) -> Self {
        let response = outcome.response;
        Self {
            question: outcome.question,
            selectors: SelectorSummary {
                tested: true,
                successful: !response.text.is_empty(),
                selector_used: response
                    .selector_used
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            answer: response.text,
            html: response.html,
            original_answer: response.original_text,
        }
    }
}

/// A JSON `{ "error": ... }` response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn parse_question(body: &[u8]) -> Result<String, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("request body must be JSON"))?;
    match value.get("question") {
        Some(Value::String(q)) if !q.trim().is_empty() => Ok(q.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(ApiError::bad_request("question is required"))
        }
        Some(_) => Err(ApiError::bad_request("question must be a string")),
    }
}

/// POST /ask
pub async fn ask(State(state): State<AppState>, body: Bytes) -> Result<Json<AskResponse>, ApiError> {
    let question = parse_question(&body)?;
    let seq = state.next_request();
    info!(target: "chatprobe.server", seq, %question, "ask request");

    let sink = state.artifact_dir.as_ref().and_then(|dir| {
        ArtifactSink::create_sequenced(dir, seq)
            .map_err(|e| warn!(target: "chatprobe.server", error = %e, "artifacts disabled for this request"))
            .ok()
    });

    let outcome = state
        .pipeline
        .ask(state.launcher.as_ref(), &AskRequest::new(question), sink.as_ref())
        .await
        .map_err(|e| {
            error!(target: "chatprobe.server", error = %e, "ask failed");
            ApiError::internal(e.to_string())
        })?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> String {
        parse_question(body.as_bytes()).unwrap_err().message
    }

    #[test]
    fn question_validation() {
        assert_eq!(parse_question(br#"{"question":"hi"}"#).unwrap(), "hi");
        assert_eq!(message("not json"), "request body must be JSON");
        assert_eq!(message("{}"), "question is required");
        assert_eq!(message(r#"{"question":""}"#), "question is required");
        assert_eq!(message(r#"{"question":"   "}"#), "question is required");
        assert_eq!(message(r#"{"question":null}"#), "question is required");
        assert_eq!(message(r#"{"question":42}"#), "question must be a string");
        assert_eq!(message("[1,2]"), "question is required");
    }
}
