use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{AiError, CompletionClient, CompletionOptions, TokenStream};
use crate::config::AiConfig;

/// Chat-completions client for Groq or any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(prompt: &str, options: &CompletionOptions, stream: bool) -> Value {
        let mut body = json!({
            "model": options.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": stream,
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn send(&self, body: &Value, timeout: Option<Duration>) -> Result<reqwest::Response, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::Unavailable)?;

        let mut request = self.client.post(self.endpoint()).bearer_auth(api_key).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream(format!("{}: {}", status, detail)));
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError> {
        let body = Self::request_body(prompt, options, false);
        let response = self.send(&body, Some(self.timeout)).await?;
        let payload: Value = response.json().await?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AiError::InvalidResponse(payload.to_string()))?;

        debug!("AI completion returned {} characters", content.len());
        Ok(content.trim().to_string())
    }

    async fn stream(&self, prompt: &str, options: &CompletionOptions) -> Result<TokenStream, AiError> {
        let body = Self::request_body(prompt, options, true);
        let response = self.send(&body, None).await?;
        Ok(sse_tokens(response.bytes_stream().boxed()))
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Token(String),
    Error(String),
    Done,
    Skip,
}

/// Interpret one line of an OpenAI-style event stream.
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(chunk) => {
            if let Some(error) = chunk.get("error") {
                return SseEvent::Error(error.to_string());
            }
            match chunk.pointer("/choices/0/delta/content").and_then(Value::as_str) {
                Some(content) if !content.is_empty() => SseEvent::Token(content.to_string()),
                _ => SseEvent::Skip,
            }
        }
        Err(_) => SseEvent::Error(format!("unparseable stream chunk: {}", data)),
    }
}

struct SseState<B> {
    body: B,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, AiError>>,
    finished: bool,
}

impl<B> SseState<B> {
    fn drain_lines(&mut self) {
        while !self.finished {
            let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
        }
    }

    fn handle_line(&mut self, line: &str) {
        match parse_sse_line(line) {
            SseEvent::Token(token) => self.pending.push_back(Ok(token)),
            SseEvent::Error(message) => {
                self.pending.push_back(Err(AiError::Upstream(message)));
                self.finished = true;
            }
            SseEvent::Done => self.finished = true,
            SseEvent::Skip => {}
        }
    }
}

fn sse_tokens<S>(body: S) -> TokenStream
where
    S: futures::Stream<Item = reqwest::Result<Bytes>> + Send + Unpin + 'static,
{
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(AiError::Transport(e.to_string())), state));
                }
                None => {
                    let rest = std::mem::take(&mut state.buffer);
                    state.handle_line(&String::from_utf8_lossy(&rest));
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
