use crate::dto::assistant_dto::{ChatPayload, ChatResponse};
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;
use validator::Validate;

pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let content = state
        .assistant_service
        .chat(&payload.messages, &payload.attachments)
        .await
        .map_err(|e| {
            tracing::error!("Assistant chat failed: {}", e);
            e
        })?;
    Ok(Json(ChatResponse { content }))
}

pub async fn chat_stream(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    payload.validate()?;

    let cancel = CancellationToken::new();
    let rx = state
        .assistant_service
        .chat_stream(&payload.messages, &payload.attachments, cancel.clone())
        .await?;

    // The guard cancels the upstream read when the client goes away and
    // axum drops this stream.
    let guard = cancel.drop_guard();
    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let delta = rx.recv().await?;
        Some((Ok(Event::default().data(delta)), (rx, guard)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
