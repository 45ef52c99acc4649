use serde::{Deserialize, Serialize};

use super::prompt::Prompt;
use super::ExtractionError;

/// How the stored file is handed to the vision model.
///
/// Images travel as a (signed) URL; PDFs go inline as a base64 data URL
/// since the completion API only dereferences image links.
#[derive(Debug, Clone)]
pub enum FilePart {
    ImageUrl(String),
    InlinePdf { base64: String },
}

impl FilePart {
    fn as_url(&self) -> String {
        match self {
            FilePart::ImageUrl(url) => url.clone(),
            FilePart::InlinePdf { base64 } => format!("data:application/pdf;base64,{base64}"),
        }
    }
}

/// Seam for the multimodal completion API; mocked in tests.
pub trait VisionClient: Send + Sync {
    fn complete(&self, prompt: &Prompt, file: &FilePart) -> Result<String, ExtractionError>;
}

/// Production client for an OpenAI-compatible chat-completions endpoint
/// (Hyperbolic by default, model `Qwen/Qwen2-VL-72B-Instruct`).
pub struct HyperbolicClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HyperbolicClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client configured from the environment (`KYCVAULT_EXTRACTION_*`).
    pub fn from_config() -> Self {
        Self::new(
            &crate::config::extraction_base_url(),
            &crate::config::extraction_api_key(),
            &crate::config::extraction_model(),
            120,
        )
    }
}

// Wire types for the chat-completions request/response.

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl VisionClient for HyperbolicClient {
    fn complete(&self, prompt: &Prompt, file: &FilePart) -> Result<String, ExtractionError> {
        if self.api_key.is_empty() {
            return Err(ExtractionError::NotConfigured(
                "KYCVAULT_EXTRACTION_API_KEY is not set".into(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(&prompt.system),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: &prompt.user },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: file.as_url(),
                            },
                        },
                    ]),
                },
            ],
            max_tokens: 512,
            temperature: 0.1,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Api(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractionError::Api(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ExtractionError::MalformedResponse("Response had no choices".into()))
    }
}

/// Mock vision client for testing.
///
/// Replays a queue of canned replies; the last reply repeats once the queue
/// drains. Tracks how many calls were made for retry assertions.
pub struct MockVisionClient {
    replies: std::sync::Mutex<Vec<Result<String, String>>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockVisionClient {
    pub fn new(response: &str) -> Self {
        Self::with_replies(vec![Ok(response.to_string())])
    }

    /// Always fails with a transport error.
    pub fn failing() -> Self {
        Self::with_replies(vec![Err("connection refused".to_string())])
    }

    pub fn with_replies(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl VisionClient for MockVisionClient {
    fn complete(&self, _prompt: &Prompt, _file: &FilePart) -> Result<String, ExtractionError> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let replies = self.replies.lock().expect("mock lock");
        let idx = n.min(replies.len().saturating_sub(1));
        match &replies[idx] {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(ExtractionError::Api(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_part_renders_as_data_url() {
        let part = FilePart::InlinePdf {
            base64: "JVBERi0=".into(),
        };
        assert_eq!(part.as_url(), "data:application/pdf;base64,JVBERi0=");
    }

    #[test]
    fn unconfigured_client_reports_missing_key() {
        let client = HyperbolicClient::new("https://api.example.test/v1", "", "test-model", 5);
        let prompt = Prompt {
            system: "s".into(),
            user: "u".into(),
        };
        let err = client
            .complete(&prompt, &FilePart::ImageUrl("https://x.test/i.png".into()))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotConfigured(_)));
    }

    #[test]
    fn mock_replays_queue_then_repeats_last() {
        let mock = MockVisionClient::with_replies(vec![
            Err("boom".into()),
            Ok("second".into()),
        ]);
        let prompt = Prompt {
            system: String::new(),
            user: String::new(),
        };
        let file = FilePart::ImageUrl("u".into());

        assert!(mock.complete(&prompt, &file).is_err());
        assert_eq!(mock.complete(&prompt, &file).unwrap(), "second");
        assert_eq!(mock.complete(&prompt, &file).unwrap(), "second");
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn request_body_serializes_openai_shape() {
        let body = CompletionRequest {
            model: "Qwen/Qwen2-VL-72B-Instruct",
            messages: vec![Message {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: "extract" },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "https://x.test/i.png".into(),
                        },
                    },
                ]),
            }],
            max_tokens: 512,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "https://x.test/i.png"
        );
    }
}
