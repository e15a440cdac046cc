use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::GenerationError;

/// Retry bound for one logical generation call. The pipeline stages never
/// retry themselves; exhaustion surfaces as an error to the orchestrator.
const MAX_ATTEMPTS: usize = 3;

/// Pause between attempts.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Sampling temperature for all extraction stages.
const TEMPERATURE: f32 = 0.7;

/// Text generation gateway abstraction (allows mocking).
pub trait TextGenerator {
    fn generate(
        &self,
        system: &str,
        user: &str,
        model: &str,
    ) -> Result<String, GenerationError>;
}

/// Blocking client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    fn call_once(
        &self,
        system: &str,
        user: &str,
        model: &str,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.base_url.clone())
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::ResponseParsing("Response has no choices".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Run a generation call up to `MAX_ATTEMPTS` times with a fixed pause
/// between attempts. Per-attempt errors are logged; exhaustion surfaces as
/// `GenerationError::Exhausted`.
fn with_retries<F>(mut call: F) -> Result<String, GenerationError>
where
    F: FnMut() -> Result<String, GenerationError>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        match call() {
            Ok(text) => return Ok(text),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Generation call failed");
                if attempt < MAX_ATTEMPTS {
                    thread::sleep(RETRY_BACKOFF);
                }
            }
        }
    }

    Err(GenerationError::Exhausted(MAX_ATTEMPTS))
}

impl TextGenerator for OpenAiClient {
    fn generate(
        &self,
        system: &str,
        user: &str,
        model: &str,
    ) -> Result<String, GenerationError> {
        with_retries(|| self.call_once(system, user, model))
    }
}

/// Mock generator for testing — returns a fixed response for every call.
pub struct MockGenerator {
    response: String,
}

impl MockGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, _: &str, _: &str, _: &str) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

/// Mock generator that replays a queue of responses in call order, then
/// repeats the last one. Useful for driving the multi-stage pipeline.
#[cfg(test)]
pub struct ScriptedGenerator {
    responses: Vec<Result<String, String>>,
    cursor: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedGenerator {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(responses: I) -> Self {
        Self {
            responses: responses.into_iter().map(|s| Ok(s.into())).collect(),
            cursor: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A scripted generator in which every call fails.
    pub fn always_failing(message: &str) -> Self {
        Self {
            responses: vec![Err(message.to_string())],
            cursor: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.cursor.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _: &str, _: &str, _: &str) -> Result<String, GenerationError> {
        let i = self
            .cursor
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let entry = self
            .responses
            .get(i)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| Ok(String::new()));
        entry.map_err(GenerationError::HttpClient)
    }
}
