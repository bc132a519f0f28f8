//! Google Gemini client with search grounding
//!
//! Uses `models/{model}:streamGenerateContent?alt=sse`. Each SSE `data:`
//! line carries a `GenerateContentResponse`; the text parts of its first
//! candidate are the next slice of the JSON document.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::StreamingResponse;
use super::TextModel;
use crate::config::AppConfig;
use crate::errors::FlashgenError;
use crate::errors::Result;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Replaces the response schema when the search tool is on; the API
/// does not accept both
const JSON_SHAPE_INSTRUCTION: &str = r#"Respond with a single JSON object and nothing else, shaped exactly as {"flashcards":[{"word":"...","definition":"..."}]}. Do not wrap it in markdown."#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

fn flashcard_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "flashcards": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "word": { "type": "STRING" },
                        "definition": { "type": "STRING" }
                    },
                    "required": ["word", "definition"]
                }
            }
        },
        "required": ["flashcards"]
    })
}

/// Client for the Gemini generative language API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    search_grounding: bool,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        search_grounding: bool,
    ) -> Result<Self> {
        // No overall timeout: streams run until the serving deadline
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            search_grounding,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm_endpoint(),
            config.llm_model(),
            config.llm.search_grounding,
        )
    }

    fn stream_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&format!(
            "{}/models/{}:streamGenerateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        ))?;
        url.query_pairs_mut().append_pair("alt", "sse");
        Ok(url)
    }

    fn build_body(&self, prompt: &str) -> GenerateContentRequest {
        let contents = vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }];

        if self.search_grounding {
            GenerateContentRequest {
                contents,
                system_instruction: Some(Content {
                    role: None,
                    parts: vec![Part {
                        text: Some(JSON_SHAPE_INSTRUCTION.to_string()),
                    }],
                }),
                tools: vec![json!({ "google_search": {} })],
                generation_config: None,
            }
        } else {
            GenerateContentRequest {
                contents,
                system_instruction: None,
                tools: Vec::new(),
                generation_config: Some(GenerationConfig {
                    response_mime_type: "application/json".to_string(),
                    response_schema: flashcard_schema(),
                }),
            }
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn stream_text(&self, api_key: &str, prompt: &str) -> Result<StreamingResponse> {
        let url = self.stream_url()?;
        debug!(
            "POST {} (model={}, grounding={})",
            url.path(),
            self.model,
            self.search_grounding
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&self.build_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FlashgenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = Box::pin(response.bytes_stream());
        let events = futures::stream::unfold(
            (bytes, SseDecoder::default(), false),
            |(mut bytes, mut sse, done)| async move {
                if done {
                    return None;
                }
                loop {
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            let items = sse.feed(&chunk);
                            if !items.is_empty() {
                                return Some((items, (bytes, sse, false)));
                            }
                        }
                        Some(Err(e)) => {
                            return Some((
                                vec![Err(FlashgenError::Stream(e.to_string()))],
                                (bytes, sse, true),
                            ));
                        }
                        None => {
                            let items = sse.finish();
                            if items.is_empty() {
                                return None;
                            }
                            return Some((items, (bytes, sse, true)));
                        }
                    }
                }
            },
        )
        .flat_map(futures::stream::iter);

        let mut filter = JsonTextFilter::default();
        let text = events
            .map(move |item| item.map(|text| filter.feed(&text)))
            .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())));

        Ok(StreamingResponse::new(Box::pin(text)))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Splits an SSE byte stream into `data:` payloads and extracts text
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String>> {
        self.buffer.extend_from_slice(chunk);
        let mut items = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(item) = Self::parse_line(&line) {
                items.push(item);
            }
        }
        items
    }

    fn finish(&mut self) -> Vec<Result<String>> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line).into_iter().collect()
    }

    fn parse_line(line: &[u8]) -> Option<Result<String>> {
        let line = String::from_utf8_lossy(line);
        let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
        if data.is_empty() {
            return None;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    return Some(Err(FlashgenError::LlmError(error.message)));
                }
                let text: String = chunk
                    .candidates
                    .into_iter()
                    .take(1)
                    .filter_map(|candidate| candidate.content)
                    .flat_map(|content| content.parts)
                    .filter_map(|part| part.text)
                    .collect();
                if text.is_empty() {
                    None
                } else {
                    Some(Ok(text))
                }
            }
            Err(e) => {
                warn!("Failed to parse SSE chunk: {e}, data: {data}");
                None
            }
        }
    }
}

/// Key that opens the flashcard document
const DOCUMENT_KEY: &str = "\"flashcards\"";

/// Cuts the JSON document out of what a grounded model writes around it.
///
/// The document starts at the first `{` followed by `"flashcards"`, so a
/// preamble (brackets included) or an opening markdown fence is skipped.
/// Forwarding stops once the top-level object closes; a closing fence or
/// any chatter after it never reaches the client.
#[derive(Debug, Default)]
struct JsonTextFilter {
    phase: FilterPhase,
    /// Unforwarded text that may still contain the document start
    preamble: String,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum FilterPhase {
    #[default]
    Searching,
    Forwarding,
    Done,
}

enum DocumentStart {
    Found(usize),
    /// A `{` at this offset may still turn into the document start
    Pending(usize),
    Absent,
}

fn find_document_start(text: &str) -> DocumentStart {
    for (idx, _) in text.match_indices('{') {
        let rest = text[idx + 1..].trim_start();
        if rest.starts_with(DOCUMENT_KEY) {
            return DocumentStart::Found(idx);
        }
        if DOCUMENT_KEY.starts_with(rest) {
            return DocumentStart::Pending(idx);
        }
    }
    DocumentStart::Absent
}

impl JsonTextFilter {
    fn feed(&mut self, chunk: &str) -> String {
        match self.phase {
            FilterPhase::Done => String::new(),
            FilterPhase::Forwarding => self.forward(chunk),
            FilterPhase::Searching => {
                self.preamble.push_str(chunk);
                match find_document_start(&self.preamble) {
                    DocumentStart::Found(idx) => {
                        self.phase = FilterPhase::Forwarding;
                        let document = self.preamble.split_off(idx);
                        self.preamble.clear();
                        self.forward(&document)
                    }
                    DocumentStart::Pending(idx) => {
                        self.preamble.drain(..idx);
                        String::new()
                    }
                    DocumentStart::Absent => {
                        self.preamble.clear();
                        String::new()
                    }
                }
            }
        }
    }

    /// Pass `text` through up to the end of the top-level value
    fn forward(&mut self, text: &str) -> String {
        for (idx, ch) in text.char_indices() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }
            match ch {
                '"' => self.in_string = true,
                '{' | '[' => self.depth += 1,
                '}' | ']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        self.phase = FilterPhase::Done;
                        return text[..idx + ch.len_utf8()].to_string();
                    }
                }
                _ => {}
            }
        }
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Flashcard;
    use crate::models::FlashcardDeck;
    use crate::models::PartialDeck;
    use crate::partial_json::PartialJsonDecoder;

    #[test]
    fn test_stream_url() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-2.0-flash-001",
            true,
        )
        .unwrap();
        assert_eq!(
            client.stream_url().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-001:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_grounded_body_uses_search_tool() {
        let client = GeminiClient::new("http://localhost", "m", true).unwrap();
        let body = serde_json::to_value(client.build_body("prompt")).unwrap();

        assert_eq!(body["tools"][0], json!({ "google_search": {} }));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
        assert!(body.get("generationConfig").is_none());
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("flashcards"));
    }

    #[test]
    fn test_ungrounded_body_uses_schema() {
        let client = GeminiClient::new("http://localhost", "m", false).unwrap();
        let body = serde_json::to_value(client.build_body("prompt")).unwrap();

        assert!(body.get("tools").is_none());
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["flashcards"]["type"],
            "ARRAY"
        );
    }

    #[test]
    fn test_sse_lines_split_across_chunks() {
        let mut sse = SseDecoder::default();
        let event = r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"{\"flash"}]}}]}"#;
        let (head, tail) = event.split_at(30);

        assert!(sse.feed(head.as_bytes()).is_empty());
        let items = sse.feed(format!("{tail}\r\n\r\n").as_bytes());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "{\"flash");
    }

    #[test]
    fn test_sse_unterminated_last_line() {
        let mut sse = SseDecoder::default();
        let items =
            sse.feed(br#"data: {"candidates":[{"content":{"parts":[{"text":"]}"}]}}]}"#);
        assert!(items.is_empty());
        let items = sse.finish();
        assert_eq!(items[0].as_ref().unwrap(), "]}");
    }

    #[test]
    fn test_sse_error_payload() {
        let mut sse = SseDecoder::default();
        let items = sse.feed(b"data: {\"error\":{\"code\":400,\"message\":\"API key not valid\"}}\n");
        assert!(matches!(&items[0], Err(FlashgenError::LlmError(m)) if m == "API key not valid"));
    }

    #[test]
    fn test_sse_skips_metadata_only_chunks() {
        let mut sse = SseDecoder::default();
        let items = sse.feed(
            b": keep-alive\n\ndata: {\"candidates\":[{\"groundingMetadata\":{}}]}\n\n",
        );
        assert!(items.is_empty());
    }

    fn filter_all(chunks: &[&str]) -> String {
        let mut filter = JsonTextFilter::default();
        chunks.iter().map(|chunk| filter.feed(chunk)).collect()
    }

    #[test]
    fn test_json_filter_strips_fences() {
        let out = filter_all(&["```json\n", "{\"flashcards\":", "[]}", "\n``", "`\n"]);
        assert_eq!(out, "{\"flashcards\":[]}");
    }

    #[test]
    fn test_json_filter_skips_bracketed_preamble() {
        let chunks = [
            "Here are flashcards about [photosynthesis] {briefly}:\n```json\n",
            "{\"flashcards\":[{\"word\":\"A\",\"definition\":\"B\"}]}\n```",
        ];
        let out = filter_all(&chunks);
        assert_eq!(out, r#"{"flashcards":[{"word":"A","definition":"B"}]}"#);

        let mut decoder = PartialJsonDecoder::new();
        decoder.push_str(&out);
        let deck = PartialDeck::from_value(&decoder.snapshot().unwrap());
        assert_eq!(deck.complete_cards(), vec![Flashcard::new("A", "B")]);
    }

    #[test]
    fn test_json_filter_drops_trailing_chatter() {
        let chunks = [
            "```json\n{\"flashcards\":[{\"word\":\"A\",\"definition\":\"B\"}]}\n```",
            "\nLet me know if you need more! {\"flashcards\":[]}",
        ];
        let out = filter_all(&chunks);

        let mut decoder = PartialJsonDecoder::new();
        decoder.push_str(&out);
        let deck: FlashcardDeck = serde_json::from_value(decoder.finalize().unwrap()).unwrap();
        assert_eq!(deck.flashcards, vec![Flashcard::new("A", "B")]);
    }

    #[test]
    fn test_json_filter_waits_for_split_key() {
        let mut filter = JsonTextFilter::default();
        assert_eq!(filter.feed("Sure! { \"flash"), "");
        assert_eq!(filter.feed("cards\": [] }"), "{ \"flashcards\": [] }");
        assert_eq!(filter.feed(" more"), "");
    }

    #[test]
    fn test_json_filter_ignores_braces_inside_strings() {
        let out = filter_all(&[
            r#"{"flashcards":[{"word":"Set {x}","definition":"A \"]}\" quote"}]}"#,
            " done",
        ]);
        assert_eq!(
            out,
            r#"{"flashcards":[{"word":"Set {x}","definition":"A \"]}\" quote"}]}"#
        );
    }
}
