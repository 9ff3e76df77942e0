//! Ollama HTTP backend
//!
//! Talks to a local `ollama serve` over its JSON API: `/api/chat` for
//! requests and `/api/tags` for discovery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use codedrop_config::OllamaConfig;
use codedrop_utils::error::LlmError;

use crate::envelope;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const PROVIDER: &str = "ollama";

/// Status probes should fail fast
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Backend for an Ollama server
#[derive(Clone)]
pub struct OllamaBackend {
    client: HttpClient,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// `base_url` is scheme, host, and port, e.g. `http://127.0.0.1:11434`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &OllamaConfig) -> Result<Self, LlmError> {
        Self::new(
            config.base_url(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True when `/api/tags` answers with a success status.
    pub async fn is_available(&self) -> bool {
        self.client
            .execute_with_retry(self.client.get(&self.url("/api/tags")), PROBE_TIMEOUT, PROVIDER)
            .await
            .is_ok()
    }

    /// Names of the models the server has pulled, in server order.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .execute_with_retry(self.client.get(&self.url("/api/tags")), PROBE_TIMEOUT, PROVIDER)
            .await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse model list: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// One system prompt and one user message; returns the reply text.
    pub async fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        let inv = LlmInvocation::chat(self.model.clone(), self.timeout, system_prompt, user_message);
        Ok(self.invoke(inv).await?.raw_response)
    }

    async fn send(&self, request: reqwest::RequestBuilder, timeout: Duration) -> Result<String, LlmError> {
        let response = self
            .client
            .execute_with_retry(request, timeout, PROVIDER)
            .await?;
        response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to read response body: {e}")))
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = if inv.model.is_empty() {
            self.model.as_str()
        } else {
            inv.model.as_str()
        };

        debug!(
            provider = PROVIDER,
            model,
            messages = inv.messages.len(),
            timeout_secs = inv.timeout.as_secs(),
            "invoking backend"
        );

        let body = ChatRequest {
            model,
            messages: &inv.messages,
            stream: false,
        };
        let request = self.client.post(&self.url("/api/chat")).json(&body);
        let text = self.send(request, inv.timeout).await?;

        let reply = envelope::chat_reply(&text);
        if reply.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let (tokens_in, tokens_out) = match serde_json::from_str::<Value>(&text) {
            Ok(v) => (
                envelope::get_u64(&v, "prompt_eval_count"),
                envelope::get_u64(&v, "eval_count"),
            ),
            Err(_) => (None, None),
        };

        debug!(provider = PROVIDER, bytes = reply.len(), "backend replied");
        Ok(LlmResult::new(reply, PROVIDER, model).with_tokens(tokens_in, tokens_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 server answering each connection with the next
    /// canned `(status, body)` and recording the request bodies.
    async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let (head_end, content_length) = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&buf).to_string();
                    if let Some(pos) = text.find("\r\n\r\n") {
                        let length = text[..pos]
                            .lines()
                            .find_map(|l| {
                                let lower = l.to_ascii_lowercase();
                                lower
                                    .strip_prefix("content-length:")
                                    .map(|v| v.trim().parse::<usize>().unwrap())
                            })
                            .unwrap_or(0);
                        break (pos + 4, length);
                    }
                };
                while buf.len() < head_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                }
                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf[head_end..]).to_string());

                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{addr}"), seen)
    }

    fn backend(base_url: &str) -> OllamaBackend {
        let mut backend = OllamaBackend::new(base_url, "llama3.2", Duration::from_secs(5)).unwrap();
        backend.client = backend.client.with_backoff(Duration::from_millis(1));
        backend
    }

    #[tokio::test]
    async fn test_chat_sends_system_and_user_messages() {
        let reply = r#"{"model":"llama3.2","message":{"role":"assistant","content":"FILE: a.txt"},"done":true,"prompt_eval_count":12,"eval_count":3}"#;
        let (url, seen) = serve(vec![(200, reply.to_string())]).await;

        let backend = backend(&url);
        let inv = LlmInvocation::chat("", Duration::from_secs(5), "be terse", "make a.txt");
        let result = backend.invoke(inv).await.unwrap();

        assert_eq!(result.raw_response, "FILE: a.txt");
        assert_eq!(result.model_used, "llama3.2");
        assert_eq!(result.tokens_input, Some(12));
        assert_eq!(result.tokens_output, Some(3));

        let body: Value = serde_json::from_str(&seen.lock().unwrap()[0]).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be terse");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "make a.txt");
    }

    #[tokio::test]
    async fn test_chat_helper_uses_current_model() {
        let reply = r#"{"message":{"role":"assistant","content":"ok"}}"#;
        let (url, seen) = serve(vec![(200, reply.to_string())]).await;

        let mut backend = backend(&url);
        backend.set_model("qwen2.5-coder");
        assert_eq!(backend.chat("sys", "hi").await.unwrap(), "ok");

        let body: Value = serde_json::from_str(&seen.lock().unwrap()[0]).unwrap();
        assert_eq!(body["model"], "qwen2.5-coder");
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let (url, _) = serve(vec![(200, r#"{"done":true}"#.to_string())]).await;
        let err = backend(&url).chat("s", "u").await.unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let ok = r#"{"message":{"content":"recovered"}}"#.to_string();
        let (url, seen) = serve(vec![(500, String::new()), (200, ok)]).await;

        assert_eq!(backend(&url).chat("s", "u").await.unwrap(), "recovered");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_models_and_availability() {
        let tags = r#"{"models":[{"name":"llama3.2:latest"},{"name":"codellama:7b"}]}"#;
        let (url, _) = serve(vec![(200, tags.to_string()), (200, tags.to_string())]).await;

        let backend = backend(&url);
        assert!(backend.is_available().await);
        assert_eq!(
            backend.list_models().await.unwrap(),
            vec!["llama3.2:latest".to_string(), "codellama:7b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend(&format!("http://{addr}"));
        assert!(!backend.is_available().await);
        let err = backend.chat("s", "u").await.unwrap_err();
        assert!(err.is_unavailable(), "{err:?}");
    }

    #[test]
    fn test_from_config_builds_base_url() {
        let config = OllamaConfig {
            host: "gpu-box".to_string(),
            port: 8080,
            model: "m".to_string(),
            timeout_secs: 7,
        };
        let backend = OllamaBackend::from_config(&config).unwrap();
        assert_eq!(backend.base_url(), "http://gpu-box:8080");
        assert_eq!(backend.timeout(), Duration::from_secs(7));
        assert_eq!(backend.model(), "m");
    }
}
