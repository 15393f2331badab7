//! `POST /v1/chat/completions`

use super::error::ApiError;
use super::openai::{
    AssistantMessage, ChatChunk, ChatCompletionRequest, ChatCompletionResponse, Choice,
    ChunkChoice, Delta, InboundMessage, Usage,
};
use super::state::AppState;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tracing::{debug, warn};

pub async fn completions(
    State(state): State<AppState>,
    Json(req): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    if req.n.unwrap_or(1) != 1 {
        return Err(ApiError::bad_request(
            "Only `n=1` is supported for chat completions",
        ));
    }

    let prompt = render_prompt(req.messages.clone())?;
    debug!(
        messages = req.messages.len(),
        stream = req.wants_stream(),
        "Chat completion request"
    );

    if req.wants_stream() {
        let include_usage = req.include_usage();
        let sse = stream_completion(state, prompt, req.backend, include_usage);
        return Ok(sse.into_response());
    }

    let result = state.client.complete(&prompt, req.backend.as_deref()).await?;
    let usage = Usage::estimate(&prompt, &result.answer);

    let response = ChatCompletionResponse {
        id: completion_id(),
        object: "chat.completion",
        created: chrono::Utc::now().timestamp(),
        model: state.model_id(),
        choices: vec![Choice {
            index: 0,
            message: AssistantMessage {
                role: "assistant",
                content: result.answer,
            },
            finish_reason: "stop",
        }],
        usage,
        metrics: result.metrics,
    };

    Ok(Json(response).into_response())
}

/// Flatten the conversation into the single prompt the binary accepts
///
/// A lone user turn is passed through unchanged; anything else becomes one
/// `Role: content` line per message.
pub fn render_prompt(messages: Vec<InboundMessage>) -> Result<String, ApiError> {
    let mut turns = Vec::with_capacity(messages.len());
    for message in messages {
        let label = role_label(&message.role)?;
        let content = message.content.map(|c| c.flatten()).unwrap_or_default();
        let content = content.trim();
        if !content.is_empty() {
            turns.push((label, content.to_string()));
        }
    }

    match turns.as_slice() {
        [] => Err(ApiError::bad_request(
            "Chat request must include at least one message with content",
        )),
        [("User", content)] => Ok(content.clone()),
        _ => Ok(turns
            .iter()
            .map(|(label, content)| format!("{label}: {content}"))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn role_label(raw: &str) -> Result<&'static str, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "system" | "developer" => Ok("System"),
        "user" => Ok("User"),
        "assistant" => Ok("Assistant"),
        other => Err(ApiError::bad_request(format!(
            "Unsupported chat message role: {other}"
        ))),
    }
}

fn completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4().simple())
}

/// SSE response whose body owns the invocation
///
/// Dropping the body (client disconnect) drops the pending invocation, which
/// kills the child process, and stops chunk emission.
fn stream_completion(
    state: AppState,
    prompt: String,
    backend: Option<String>,
    include_usage: bool,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = completion_id();
    let created = chrono::Utc::now().timestamp();
    let model = state.model_id();

    let chunk = move |delta: Delta, finish_reason: Option<&'static str>, usage: Option<Usage>| {
        let chunk = ChatChunk {
            id: id.clone(),
            object: "chat.completion.chunk",
            created,
            model: model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            usage,
        };
        Event::default().data(serde_json::to_string(&chunk).unwrap_or_default())
    };

    let stream = async_stream::stream! {
        yield Ok(chunk(
            Delta { role: Some("assistant"), content: None },
            None,
            None,
        ));

        match state.client.complete(&prompt, backend.as_deref()).await {
            Ok(result) => {
                let mut pieces = Box::pin(state.synthesizer.stream(&result.answer));
                while let Some(piece) = pieces.next().await {
                    yield Ok(chunk(Delta { role: None, content: Some(piece) }, None, None));
                }
                let usage = include_usage.then(|| Usage::estimate(&prompt, &result.answer));
                yield Ok(chunk(Delta::default(), Some("stop"), usage));
            }
            Err(err) => {
                warn!("Streaming completion failed: {}", err);
                yield Ok(Event::default().data(ApiError::from(err).body().to_string()));
            }
        }

        yield Ok(Event::default().data("[DONE]"));
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
