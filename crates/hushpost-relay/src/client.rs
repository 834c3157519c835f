use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::prompt::{ChatRequest, build_messages};
use crate::sse::SseParser;

/// Text deltas from the provider, in arrival order.
pub type SuggestionStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("suggestion provider is not configured")]
    MissingApiKey,

    #[error("request to suggestion provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("suggestion provider returned status {0}")]
    Status(u16),

    #[error("suggestion provider did not respond in time")]
    Timeout,

    #[error("suggestion provider ended the stream without any text")]
    NoOutput,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base of an OpenAI-compatible API, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Bound on connecting and receiving the response head.
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two upstream chunks.
    pub idle_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            api_key: None,
            model: "x-ai/grok-4.1-fast".into(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct SuggestionRelay {
    http: reqwest::Client,
    config: RelayConfig,
}

impl SuggestionRelay {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Open the upstream completion and hand back its text deltas as a byte
    /// stream.
    ///
    /// Waits for the first text fragment before returning, so a provider that
    /// fails before producing any text is reported as an error. After that,
    /// any upstream failure, idle timeout or in-band error event just ends the
    /// stream, so a short stream may be an incomplete one. Dropping the
    /// returned stream drops the upstream response and its connection.
    pub async fn stream(
        &self,
        post_content: &str,
        user_draft: &str,
    ) -> Result<SuggestionStream, RelayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(RelayError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            stream: true,
            messages: build_messages(post_content, user_draft),
        };

        let request = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.config.connect_timeout, request)
            .await
            .map_err(|_| RelayError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            match tokio::time::timeout(self.config.connect_timeout, response.text()).await {
                Ok(Ok(detail)) => warn!("Suggestion provider returned {}: {}", status, detail),
                _ => warn!("Suggestion provider returned {}", status),
            }
            return Err(RelayError::Status(status.as_u16()));
        }

        info!("Suggestion stream opened (model {})", self.config.model);
        let fragments = relay_fragments(response.bytes_stream(), self.config.idle_timeout);
        open_with_first(fragments).await
    }
}

/// Pull the first fragment so an empty stream surfaces as an error, then put
/// it back in front of the rest.
async fn open_with_first<S>(fragments: S) -> Result<SuggestionStream, RelayError>
where
    S: Stream<Item = Bytes> + Send + 'static,
{
    let mut fragments = Box::pin(fragments);
    match fragments.next().await {
        Some(first) => Ok(Box::pin(futures_util::stream::once(async move { first }).chain(fragments))),
        None => {
            warn!("Suggestion stream ended before any text");
            Err(RelayError::NoOutput)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Fragment {
    Text(String),
    Skip,
    Done,
    Failed(String),
}

fn decode_event(data: &str) -> Fragment {
    if data.trim() == "[DONE]" {
        return Fragment::Done;
    }

    let chunk: ChatChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("Skipping undecodable upstream event: {}", e);
            return Fragment::Skip;
        }
    };

    if let Some(error) = chunk.error {
        return Fragment::Failed(error.to_string());
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
    {
        Some(text) if !text.is_empty() => Fragment::Text(text),
        _ => Fragment::Skip,
    }
}

/// Turn an upstream SSE byte stream into a stream of text deltas.
pub fn relay_fragments<S, E>(upstream: S, idle_timeout: Duration) -> impl Stream<Item = Bytes> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        let mut parser = SseParser::new();

        loop {
            let chunk = match tokio::time::timeout(idle_timeout, upstream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    warn!("Suggestion stream cut off: {}", e);
                    return;
                }
                Ok(None) => break,
                Err(_) => {
                    warn!("Suggestion stream idle for {:?}, ending early", idle_timeout);
                    return;
                }
            };

            for event in parser.push(&chunk) {
                match decode_event(&event.data) {
                    Fragment::Text(text) => yield Bytes::from(text),
                    Fragment::Skip => {}
                    Fragment::Done => return,
                    Fragment::Failed(detail) => {
                        warn!("Suggestion provider reported an error mid-stream: {}", detail);
                        return;
                    }
                }
            }
        }

        if let Some(event) = parser.finish() {
            if let Fragment::Text(text) = decode_event(&event.data) {
                yield Bytes::from(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn delta(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
        )
    }

    async fn collect(chunks: Vec<Result<Bytes, String>>) -> String {
        let out: Vec<Bytes> = relay_fragments(stream::iter(chunks), Duration::from_secs(5))
            .collect()
            .await;
        out.iter().map(|b| String::from_utf8_lossy(b).into_owned()).collect()
    }

    #[test]
    fn decodes_deltas_and_terminator() {
        assert_eq!(decode_event(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#), Fragment::Text("Hi".into()));
        assert_eq!(decode_event(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), Fragment::Skip);
        assert_eq!(decode_event(r#"{"choices":[]}"#), Fragment::Skip);
        assert_eq!(decode_event("[DONE]"), Fragment::Done);
        assert!(matches!(decode_event(r#"{"error":{"message":"overloaded"}}"#), Fragment::Failed(_)));
    }

    #[tokio::test]
    async fn passes_text_through_unmodified() {
        let chunks = vec![
            Ok(Bytes::from(": keep-alive\n\n")),
            Ok(Bytes::from(delta("Sounds fun!"))),
            Ok(Bytes::from(delta("||Tell me more||"))),
            Ok(Bytes::from(delta("Nice one"))),
            Ok(Bytes::from("data: [DONE]\n\n")),
        ];
        assert_eq!(collect(chunks).await, "Sounds fun!||Tell me more||Nice one");
    }

    #[tokio::test]
    async fn event_split_over_network_chunks() {
        let whole = delta("split");
        let (a, b) = whole.split_at(10);
        let chunks = vec![Ok(Bytes::from(a.to_string())), Ok(Bytes::from(b.to_string()))];
        assert_eq!(collect(chunks).await, "split");
    }

    #[tokio::test]
    async fn upstream_failure_ends_stream_after_partial_output() {
        let chunks = vec![
            Ok(Bytes::from(delta("partial"))),
            Err("connection reset".to_string()),
            Ok(Bytes::from(delta("never seen"))),
        ];
        assert_eq!(collect(chunks).await, "partial");
    }

    #[tokio::test]
    async fn nothing_after_done() {
        let chunks = vec![
            Ok(Bytes::from(delta("a"))),
            Ok(Bytes::from(format!("data: [DONE]\n\n{}", delta("b")))),
        ];
        assert_eq!(collect(chunks).await, "a");
    }

    #[tokio::test]
    async fn in_band_error_ends_stream() {
        let chunks = vec![
            Ok(Bytes::from(delta("ok"))),
            Ok(Bytes::from("data: {\"error\":{\"message\":\"boom\"}}\n\n")),
            Ok(Bytes::from(delta("late"))),
        ];
        assert_eq!(collect(chunks).await, "ok");
    }

    #[tokio::test]
    async fn idle_upstream_ends_stream() {
        let head = stream::iter(vec![Ok::<_, String>(Bytes::from(delta("first")))]);
        let upstream = head.chain(stream::pending());
        let out: Vec<Bytes> = relay_fragments(upstream, Duration::from_millis(50))
            .collect()
            .await;
        assert_eq!(out, vec![Bytes::from("first")]);
    }

    #[tokio::test]
    async fn first_fragment_is_kept_in_front() {
        let chunks = vec![Ok::<_, String>(Bytes::from(delta("one"))), Ok(Bytes::from(delta("two")))];
        let opened = open_with_first(relay_fragments(stream::iter(chunks), Duration::from_secs(5)))
            .await
            .unwrap();
        let out: Vec<Bytes> = opened.collect().await;
        assert_eq!(out, vec![Bytes::from("one"), Bytes::from("two")]);
    }

    #[tokio::test]
    async fn failure_before_any_text_is_an_error() {
        let in_band = vec![Ok::<_, String>(Bytes::from("data: {\"error\":{\"message\":\"overloaded\"}}\n\n"))];
        let cut_off = vec![Ok(Bytes::from(": keep-alive\n\n")), Err("connection reset".to_string())];
        let done_only = vec![Ok(Bytes::from("data: [DONE]\n\n"))];

        for chunks in [in_band, cut_off, done_only] {
            let opened = open_with_first(relay_fragments(stream::iter(chunks), Duration::from_secs(5))).await;
            assert!(matches!(opened, Err(RelayError::NoOutput)));
        }

        let silent = stream::pending::<Result<Bytes, String>>();
        let opened = open_with_first(relay_fragments(silent, Duration::from_millis(50))).await;
        assert!(matches!(opened, Err(RelayError::NoOutput)));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let relay = SuggestionRelay::new(RelayConfig::default()).unwrap();
        assert!(matches!(
            relay.stream("post", "draft").await,
            Err(RelayError::MissingApiKey)
        ));
    }
}
