//! The chat session: one shared transcript with a simulated assistant.

use crate::AppState;
use crate::api::models::chat::{CancelResponse, SendMessageRequest, SendMessageResponse, TranscriptResponse};
use crate::chat::export_file_name;
use crate::db::handlers::{Models, Repository};
use crate::errors::{Error, Result};
use crate::types::ModelId;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

/// The model a message is addressed to: the requested one, or the default model.
async fn resolve_model(state: &AppState, requested: Option<ModelId>) -> Result<ModelId> {
    let mut table = state.store.models().await;
    let mut repo = Models::new(&mut table);

    let model = match requested {
        Some(id) => repo.get_by_id(id.clone()).await?.ok_or_else(|| Error::BadRequest {
            message: format!("Unknown model '{id}'"),
        })?,
        None => repo.default_model().await?.ok_or_else(|| Error::BadRequest {
            message: "No model is configured; add a model before chatting".to_string(),
        })?,
    };

    if !model.enabled {
        return Err(Error::BadRequest {
            message: format!("Model '{}' is disabled", model.id),
        });
    }
    Ok(model.id)
}

#[utoipa::path(
    get,
    path = "/chat/messages",
    tag = "chat",
    summary = "Get the transcript",
    responses(
        (status = 200, description = "Messages oldest first, starting with the greeting", body = TranscriptResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_messages(State(state): State<AppState>) -> Json<TranscriptResponse> {
    Json(TranscriptResponse {
        messages: state.chat.transcript().await,
        pending: state.chat.is_pending().await,
    })
}

#[utoipa::path(
    post,
    path = "/chat/messages",
    tag = "chat",
    summary = "Send a message",
    description = "Appends the message and starts the assistant's reply, which is appended to the \
                   transcript once it is ready. Poll `GET /chat/messages` for it.",
    request_body = SendMessageRequest,
    responses(
        (status = 202, description = "Message appended, reply pending", body = SendMessageResponse),
        (status = 400, description = "Unknown or disabled model, or no model configured"),
        (status = 409, description = "A reply is still pending"),
        (status = 422, description = "Blank message"),
    )
)]
#[tracing::instrument(skip_all, fields(model = ?request.model))]
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>)> {
    let model = resolve_model(&state, request.model).await?;
    let pending = state.chat.send_message(&request.content, &model).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SendMessageResponse {
            message: pending.message().clone(),
            model: pending.model().clone(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/chat/messages",
    tag = "chat",
    summary = "Clear the transcript",
    description = "Resets the transcript to the greeting and cancels any pending reply.",
    responses((status = 204, description = "Transcript cleared"))
)]
#[tracing::instrument(skip_all)]
pub async fn clear_messages(State(state): State<AppState>) -> StatusCode {
    state.chat.clear().await;
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/chat/cancel",
    tag = "chat",
    summary = "Cancel the pending reply",
    responses((status = 200, description = "Whether a reply was cancelled", body = CancelResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn cancel_reply(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.chat.cancel_pending().await,
    })
}

#[utoipa::path(
    get,
    path = "/chat/export",
    tag = "chat",
    summary = "Export the transcript",
    description = "The transcript as a pretty-printed JSON attachment named `chat-export-YYYY-MM-DD.json`.",
    responses((status = 200, description = "Transcript download", content_type = "application/json", body = Vec<crate::chat::ChatMessage>))
)]
#[tracing::instrument(skip_all)]
pub async fn export_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.chat.export().await?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(Utc::now().date_naive()));
    Ok((
        [(header::CONTENT_TYPE, "application/json".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::models::chat::{CancelResponse, SendMessageResponse, TranscriptResponse};
    use crate::chat::{ChatMessage, ChatRole};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::time::Duration;

    const BASE: &str = "/admin/api/v1/chat";

    async fn wait_for_reply(app: &axum_test::TestServer) -> TranscriptResponse {
        for _ in 0..50 {
            let transcript: TranscriptResponse = app.get(&format!("{BASE}/messages")).await.json();
            if !transcript.pending {
                return transcript;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply never arrived");
    }

    #[test_log::test(tokio::test)]
    async fn test_transcript_starts_with_greeting() {
        let (app, _state) = create_test_app().await;

        let transcript: TranscriptResponse = app.get(&format!("{BASE}/messages")).await.json();
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].role, ChatRole::Assistant);
        assert!(!transcript.pending);
    }

    #[test_log::test(tokio::test)]
    async fn test_send_uses_default_model_and_replies_once() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        let response = app.post(&format!("{BASE}/messages")).json(&json!({"content": "hello"})).await;
        response.assert_status(StatusCode::ACCEPTED);
        let sent: SendMessageResponse = response.json();
        assert_eq!(sent.model, "gpt-4");
        assert_eq!(sent.message.content, "hello");

        let transcript = wait_for_reply(&app).await;
        assert_eq!(transcript.messages.len(), 3);
        let reply = &transcript.messages[2];
        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.content.contains("hello"));
        assert!(reply.content.contains("gpt-4"));
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_disabled_or_missing_model_is_bad_request() {
        let (app, state) = create_test_app().await;

        app.post(&format!("{BASE}/messages"))
            .json(&json!({"content": "hello"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        create_test_model(&state, "gpt-4").await;
        app.post(&format!("{BASE}/messages"))
            .json(&json!({"content": "hello", "model": "missing"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.post("/admin/api/v1/models/gpt-4/toggle").await.assert_status_ok();
        app.post(&format!("{BASE}/messages"))
            .json(&json!({"content": "hello", "model": "gpt-4"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let transcript: TranscriptResponse = app.get(&format!("{BASE}/messages")).await.json();
        assert_eq!(transcript.messages.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_blank_message_is_unprocessable() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        let response = app.post(&format!("{BASE}/messages")).json(&json!({"content": "  "})).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "content");
    }

    #[test_log::test(tokio::test)]
    async fn test_cancel_and_concurrent_send() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        app.post(&format!("{BASE}/messages"))
            .json(&json!({"content": "first"}))
            .await
            .assert_status(StatusCode::ACCEPTED);
        app.post(&format!("{BASE}/messages"))
            .json(&json!({"content": "second"}))
            .await
            .assert_status(StatusCode::CONFLICT);

        let cancelled: CancelResponse = app.post(&format!("{BASE}/cancel")).await.json();
        assert!(cancelled.cancelled);
        let again: CancelResponse = app.post(&format!("{BASE}/cancel")).await.json();
        assert!(!again.cancelled);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let transcript: TranscriptResponse = app.get(&format!("{BASE}/messages")).await.json();
        assert_eq!(transcript.messages.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_clear_and_export() {
        let (app, state) = create_test_app().await;
        create_test_model(&state, "gpt-4").await;

        app.post(&format!("{BASE}/messages")).json(&json!({"content": "hello"})).await;
        wait_for_reply(&app).await;

        let response = app.get(&format!("{BASE}/export")).await;
        response.assert_status_ok();
        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"chat-export-"));
        assert!(disposition.ends_with(".json\""));
        let exported: Vec<ChatMessage> = serde_json::from_str(&response.text()).unwrap();
        assert_eq!(exported.len(), 3);

        app.delete(&format!("{BASE}/messages")).await.assert_status(StatusCode::NO_CONTENT);
        let transcript: TranscriptResponse = app.get(&format!("{BASE}/messages")).await.json();
        assert_eq!(transcript.messages.len(), 1);
    }
}
