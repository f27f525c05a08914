use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// PDF parser engines, tried in order: when the first fails the request is
/// retried once with the fallback before surfacing an error.
const PDF_ENGINES: [&str; 2] = ["pdf-text", "mistral-ocr"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatAttachment {
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

impl ChatAttachment {
    pub fn from_bytes(file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf"
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

/// One parsed line of the server-sent event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
}

/// Parses a single `data: {...}` line. Anything that is not a well-formed
/// chunk yields `None`: a malformed chunk is skipped, never fatal, because
/// the next line may be valid again.
pub fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    let value: JsonValue = serde_json::from_str(payload).ok()?;
    let content = value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()?;
    Some(StreamEvent::Delta(content.to_string()))
}

#[derive(Clone)]
pub struct AssistantService {
    client: Client,
    api_key: String,
    api_url: String,
}

impl AssistantService {
    pub fn new(api_key: String, api_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            api_url,
        }
    }

    /// Complete (non-streaming) chat call. PDF attachments get one retry
    /// with the alternate parser engine before the failure is surfaced.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        attachments: &[ChatAttachment],
    ) -> Result<String> {
        let has_pdf = attachments.iter().any(|a| a.is_pdf());
        let engines: &[&str] = if has_pdf { &PDF_ENGINES } else { &PDF_ENGINES[..1] };

        let mut last_err = None;
        for engine in engines {
            let payload = build_payload(messages, attachments, has_pdf.then_some(engine), false);
            match self.send(payload).await {
                Ok(body) => return extract_message_content(&body),
                Err(e) => {
                    tracing::warn!("Assistant call failed with engine {}: {}", engine, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::ExternalService("Assistant request could not be sent".to_string())
        }))
    }

    /// Streaming chat call. Chunks are forwarded append-only in arrival
    /// order; malformed chunks are skipped; the token cancels between
    /// chunks on caller teardown. A PDF-engine failure surfaces before the
    /// first chunk, so it gets the same one-retry with the alternate
    /// engine as the non-streaming path.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        attachments: &[ChatAttachment],
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<String>> {
        let has_pdf = attachments.iter().any(|a| a.is_pdf());
        let engines: &[&str] = if has_pdf { &PDF_ENGINES } else { &PDF_ENGINES[..1] };

        let mut last_err = None;
        for engine in engines {
            let payload = build_payload(messages, attachments, has_pdf.then_some(engine), true);
            let result = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .timeout(Duration::from_secs(300))
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(spawn_stream_reader(response, cancel.clone()));
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    tracing::warn!(
                        "Assistant stream failed with engine {}: {} {}",
                        engine,
                        status,
                        text
                    );
                    last_err = Some(Error::ExternalService(format!(
                        "Assistant API error {}: {}",
                        status, text
                    )));
                }
                Err(e) => {
                    tracing::warn!("Assistant stream failed with engine {}: {}", engine, e);
                    last_err = Some(e.into());
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::ExternalService("Assistant request could not be sent".to_string())
        }))
    }

    async fn send(&self, payload: JsonValue) -> Result<JsonValue> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Assistant API error {}: {}",
                status, text
            )));
        }
        Ok(response.json().await?)
    }
}

/// Forwards parsed deltas from the response body to a channel until the
/// stream ends, the receiver drops, or the token cancels.
fn spawn_stream_reader(
    response: reqwest::Response,
    cancel: CancellationToken,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Assistant stream cancelled by caller");
                    break;
                }
                chunk = stream.next() => chunk,
            };
            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    tracing::warn!("Assistant stream read error: {}", e);
                    break;
                }
                None => break,
            };
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                match parse_stream_line(&line) {
                    Some(StreamEvent::Delta(delta)) => {
                        if tx.send(delta).await.is_err() {
                            return; // receiver dropped
                        }
                    }
                    Some(StreamEvent::Done) => return,
                    None => {
                        if !line.trim().is_empty() {
                            tracing::debug!("Skipping malformed stream chunk");
                        }
                    }
                }
            }
        }
    });
    rx
}

fn extract_message_content(body: &JsonValue) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::ExternalService("Invalid assistant response format".to_string()))
}

fn build_payload(
    messages: &[ChatMessage],
    attachments: &[ChatAttachment],
    pdf_engine: Option<&&str>,
    stream: bool,
) -> JsonValue {
    let mut rendered: Vec<JsonValue> = messages
        .iter()
        .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
        .collect();

    if !attachments.is_empty() {
        let mut parts: Vec<JsonValue> = Vec::new();
        if let Some(last) = rendered.pop() {
            if let Some(text) = last.get("content").and_then(|c| c.as_str()) {
                parts.push(serde_json::json!({"type": "text", "text": text}));
            }
        }
        for attachment in attachments {
            parts.push(serde_json::json!({
                "type": "file",
                "file": {
                    "filename": attachment.file_name,
                    "file_data": format!(
                        "data:{};base64,{}",
                        attachment.content_type, attachment.data
                    )
                }
            }));
        }
        rendered.push(serde_json::json!({"role": "user", "content": parts}));
    }

    let mut payload = serde_json::json!({
        "model": "gpt-4o",
        "messages": rendered,
        "stream": stream,
    });
    if let Some(engine) = pdf_engine {
        payload["plugins"] = serde_json::json!([
            {"id": "file-parser", "pdf": {"engine": engine}}
        ]);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delta_chunks() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(
            parse_stream_line(line),
            Some(StreamEvent::Delta("Hel".to_string()))
        );
    }

    #[test]
    fn parses_done_marker() {
        assert_eq!(parse_stream_line("data: [DONE]"), Some(StreamEvent::Done));
        assert_eq!(parse_stream_line("data:[DONE]\r"), Some(StreamEvent::Done));
    }

    #[test]
    fn malformed_chunks_are_skipped_not_fatal() {
        assert_eq!(parse_stream_line("data: {not json"), None);
        assert_eq!(parse_stream_line(r#"data: {"choices":[]}"#), None);
        assert_eq!(parse_stream_line(""), None);
        assert_eq!(parse_stream_line(": keep-alive comment"), None);
        // a valid line right after still parses
        let line = r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#;
        assert_eq!(
            parse_stream_line(line),
            Some(StreamEvent::Delta("lo".to_string()))
        );
    }

    #[test]
    fn chunk_order_is_preserved() {
        let lines = [
            r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
            r#"data: garbage"#,
            r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"c"}}]}"#,
            "data: [DONE]",
        ];
        let mut out = String::new();
        for line in lines {
            match parse_stream_line(line) {
                Some(StreamEvent::Delta(d)) => out.push_str(&d),
                Some(StreamEvent::Done) => break,
                None => continue,
            }
        }
        assert_eq!(out, "abc");
    }

    #[test]
    fn pdf_attachment_adds_engine_plugin() {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "Summarize my resume".to_string(),
        }];
        let attachment = ChatAttachment::from_bytes("cv.pdf", "application/pdf", b"%PDF");
        let payload = build_payload(&messages, &[attachment], Some(&"pdf-text"), false);
        assert_eq!(payload["plugins"][0]["pdf"]["engine"], "pdf-text");
        // attachment folded into the last user message as a file part
        let parts = payload["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "file");
    }

    #[test]
    fn plain_chat_has_no_plugin_block() {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "Hi".to_string(),
        }];
        let payload = build_payload(&messages, &[], None, true);
        assert!(payload.get("plugins").is_none());
        assert_eq!(payload["stream"], true);
    }

    #[test]
    fn extract_content_rejects_unexpected_shapes() {
        let ok = serde_json::json!({"choices":[{"message":{"content":"hello"}}]});
        assert_eq!(extract_message_content(&ok).unwrap(), "hello");
        let bad = serde_json::json!({"choices":[]});
        assert!(extract_message_content(&bad).is_err());
    }

    async fn spawn_stub(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    #[tokio::test]
    async fn streaming_pdf_failure_retries_once_with_the_fallback_engine() {
        use axum::{response::IntoResponse, routing::post, Router};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |axum::Json(body): axum::Json<JsonValue>| {
                let hits = handler_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let engine = body["plugins"][0]["pdf"]["engine"]
                        .as_str()
                        .unwrap_or_default();
                    if engine == "pdf-text" {
                        (axum::http::StatusCode::BAD_GATEWAY, "parser failed").into_response()
                    } else {
                        (
                            [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
                            concat!(
                                "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
                                "data: [DONE]\n\n"
                            ),
                        )
                            .into_response()
                    }
                }
            }),
        );
        let api_url = spawn_stub(app).await;

        let service =
            AssistantService::new("test-key".to_string(), api_url, reqwest::Client::new());
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "Summarize my resume".to_string(),
        }];
        let attachment = ChatAttachment::from_bytes("cv.pdf", "application/pdf", b"%PDF");
        let mut rx = service
            .chat_stream(&messages, &[attachment], CancellationToken::new())
            .await
            .expect("fallback engine succeeds");

        let mut out = String::new();
        while let Some(delta) = rx.recv().await {
            out.push_str(&delta);
        }
        assert_eq!(out, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn streaming_without_pdf_fails_after_a_single_attempt() {
        use axum::{routing::post, Router};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let hits = handler_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down")
                }
            }),
        );
        let api_url = spawn_stub(app).await;

        let service =
            AssistantService::new("test-key".to_string(), api_url, reqwest::Client::new());
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "Hi".to_string(),
        }];
        let result = service
            .chat_stream(&messages, &[], CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::ExternalService(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
