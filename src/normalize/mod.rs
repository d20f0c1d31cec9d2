//! Response normalization for remote agent invocations.
//!
//! Remote agents answer in one of three encodings:
//!
//! 1. buffered JSON (`application/json`), delivered as byte chunks that
//!    concatenate into one document;
//! 2. server-sent events (`text/event-stream`), delivered as lines;
//! 3. anything else, delivered as opaque chunks or a pre-rendered body.
//!
//! [`normalize`] turns every one of them into plain text and never fails.
//! Malformed upstream JSON degrades to the raw body.
//!
//! Text extraction from a JSON document runs an ordered list of extractors
//! ([`EXTRACTORS`]); the first that yields a string wins.

use serde_json::Value;

/// Prefix stripped from event-stream lines.
const SSE_DATA_PREFIX: &str = "data: ";

// ============================================================================
// Wire body
// ============================================================================

/// One piece of a streamed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Bytes(Vec<u8>),
    Text(String),
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl From<&[u8]> for Chunk {
    fn from(bytes: &[u8]) -> Self {
        Chunk::Bytes(bytes.to_vec())
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::Text(text.to_string())
    }
}

/// A response body as received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Iterable body: byte chunks, decoded strings, or event-stream lines.
    Chunks(Vec<Chunk>),
    /// Body without chunk iteration; used verbatim.
    Opaque(String),
}

impl ResponseBody {
    /// Build a line-oriented body, one chunk per line.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResponseBody::Chunks(
            lines
                .into_iter()
                .map(|line| {
                    let mut text: String = line.into();
                    text.push('\n');
                    Chunk::Text(text)
                })
                .collect(),
        )
    }

    /// Concatenate every chunk, decoding bytes as lossy UTF-8.
    ///
    /// Consecutive byte chunks are decoded as one run, so a character split
    /// across network chunks survives.
    pub fn concat(&self) -> String {
        match self {
            ResponseBody::Chunks(chunks) => {
                let mut out = String::new();
                let mut pending: Vec<u8> = Vec::new();
                for chunk in chunks {
                    match chunk {
                        Chunk::Bytes(bytes) => pending.extend_from_slice(bytes),
                        Chunk::Text(text) => {
                            flush_bytes(&mut pending, &mut out);
                            out.push_str(text);
                        }
                    }
                }
                flush_bytes(&mut pending, &mut out);
                out
            }
            ResponseBody::Opaque(text) => text.clone(),
        }
    }
}

fn flush_bytes(pending: &mut Vec<u8>, out: &mut String) {
    if !pending.is_empty() {
        out.push_str(&String::from_utf8_lossy(pending));
        pending.clear();
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Chunks(Vec::new())
    }
}

/// Raw response handed from a transport to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Declared content type, if the transport reported one.
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl RawResponse {
    pub fn new(content_type: Option<&str>, body: ResponseBody) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            body,
        }
    }

    /// Buffered JSON response.
    pub fn json(value: &Value) -> Self {
        Self::new(
            Some("application/json"),
            ResponseBody::Chunks(vec![Chunk::Bytes(value.to_string().into_bytes())]),
        )
    }

    /// Event-stream response made of the given lines.
    pub fn event_stream<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Some("text/event-stream"), ResponseBody::from_lines(lines))
    }

    /// Normalize this response to text.
    pub fn into_text(self) -> String {
        normalize(self.content_type.as_deref(), &self.body)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Decoding path chosen from the declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    EventStream,
    Opaque,
}

impl Encoding {
    fn detect(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Encoding::Opaque;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == "application/json" {
            Encoding::Json
        } else if content_type.contains("text/event-stream") {
            Encoding::EventStream
        } else {
            Encoding::Opaque
        }
    }
}

/// Decode a remote agent response into plain text.
///
/// # Example
///
/// ```
/// use switchboard::normalize::{normalize, ResponseBody};
///
/// let body = ResponseBody::Chunks(vec![br#"{"result":"hi"}"#.to_vec().into()]);
/// assert_eq!(normalize(Some("application/json"), &body), "hi");
///
/// let body = ResponseBody::from_lines(["data: foo", "data: bar"]);
/// assert_eq!(normalize(Some("text/event-stream"), &body), "foo\nbar");
/// ```
pub fn normalize(content_type: Option<&str>, body: &ResponseBody) -> String {
    match Encoding::detect(content_type) {
        Encoding::Json => {
            let raw = body.concat();
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => extract_text(&value),
                Err(e) => {
                    tracing::debug!(error = %e, "Agent response is not valid JSON, using raw body");
                    raw
                }
            }
        }
        Encoding::EventStream => decode_event_stream(&body.concat()),
        Encoding::Opaque => body.concat(),
    }
}

/// Strip the `data: ` prefix from every line and join with newlines.
/// Empty lines are frame separators and are dropped.
fn decode_event_stream(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_prefix(SSE_DATA_PREFIX).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Text extraction
// ============================================================================

/// An extractor tries one JSON shape and yields text when it matches.
pub type Extractor = fn(&Value) -> Option<String>;

/// Extractors in priority order. The last one always succeeds.
pub const EXTRACTORS: &[Extractor] = &[
    extract_envelope,
    extract_result,
    extract_message,
    extract_fallback,
];

/// Run [`EXTRACTORS`] in order over `value`.
pub fn extract_text(value: &Value) -> String {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(value))
        .unwrap_or_else(|| value.to_string())
}

/// `value.content[0].text`
fn extract_envelope(value: &Value) -> Option<String> {
    value
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// An envelope or a plain string under `field`.
fn envelope_or_string(value: &Value, field: &str) -> Option<String> {
    let inner = value.get(field)?;
    if let Some(text) = inner.as_str() {
        return Some(text.to_string());
    }
    extract_envelope(inner)
}

/// `value.result`
fn extract_result(value: &Value) -> Option<String> {
    envelope_or_string(value, "result")
}

/// `value.message`
fn extract_message(value: &Value) -> Option<String> {
    envelope_or_string(value, "message")
}

/// Whole value. A bare JSON string is used without quotes.
fn extract_fallback(value: &Value) -> Option<String> {
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_body(raw: &str) -> ResponseBody {
        ResponseBody::Chunks(vec![Chunk::Bytes(raw.as_bytes().to_vec())])
    }

    #[test]
    fn test_envelope() {
        let body = json_body(r#"{"content":[{"text":"hi"}]}"#);
        assert_eq!(normalize(Some("application/json"), &body), "hi");
    }

    #[test]
    fn test_result_string() {
        let body = json_body(r#"{"result":"hi"}"#);
        assert_eq!(normalize(Some("application/json"), &body), "hi");
    }

    #[test]
    fn test_result_envelope() {
        let body = json_body(r#"{"result":{"role":"assistant","content":[{"text":"hi"}]}}"#);
        assert_eq!(normalize(Some("application/json"), &body), "hi");
    }

    #[test]
    fn test_message_envelope() {
        let body = json_body(r#"{"message":{"content":[{"text":"hi"}]}}"#);
        assert_eq!(normalize(Some("application/json"), &body), "hi");
    }

    #[test]
    fn test_priority_order() {
        let value = json!({
            "message": "third",
            "result": "second",
            "content": [{"text": "first"}]
        });
        assert_eq!(extract_text(&value), "first");

        let value = json!({"message": "third", "result": "second"});
        assert_eq!(extract_text(&value), "second");

        // A non-string, non-envelope result falls through to message.
        let value = json!({"message": "third", "result": 42});
        assert_eq!(extract_text(&value), "third");
    }

    #[test]
    fn test_fallback_stringifies() {
        let value = json!({"status": "ok", "value": 345});
        let text = extract_text(&value);
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, value);

        assert_eq!(extract_text(&json!("plain")), "plain");
        assert_eq!(extract_text(&json!(345)), "345");
        // Empty content array is not an envelope.
        assert_eq!(extract_text(&json!({"content": []})), r#"{"content":[]}"#);
    }

    #[test]
    fn test_malformed_json_returns_raw() {
        let body = ResponseBody::Chunks(vec![Chunk::Bytes(b"{not json".to_vec())]);
        assert_eq!(normalize(Some("application/json"), &body), "{not json");
    }

    #[test]
    fn test_json_split_across_chunks() {
        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(br#"{"content":[{"te"#.to_vec()),
            Chunk::Bytes(br#"xt":"345"}]}"#.to_vec()),
        ]);
        assert_eq!(normalize(Some("application/json"), &body), "345");
    }

    #[test]
    fn test_json_content_type_with_parameters() {
        let body = json_body(r#"{"result":"hi"}"#);
        assert_eq!(normalize(Some("application/json; charset=utf-8"), &body), "hi");
        assert_eq!(normalize(Some("Application/JSON"), &body), "hi");
    }

    #[test]
    fn test_event_stream_lines() {
        let body = ResponseBody::from_lines(["data: foo", "data: bar"]);
        assert_eq!(normalize(Some("text/event-stream"), &body), "foo\nbar");
    }

    #[test]
    fn test_event_stream_split_chunks_and_separators() {
        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(b"data: fo".to_vec()),
            Chunk::Bytes(b"o\n\ndata: bar\r\n\n".to_vec()),
            Chunk::Text("plain line\n".into()),
        ]);
        assert_eq!(
            normalize(Some("text/event-stream; charset=utf-8"), &body),
            "foo\nbar\nplain line"
        );
    }

    #[test]
    fn test_unknown_content_type_concatenates_chunks() {
        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(b"34".to_vec()),
            Chunk::Text("5".into()),
        ]);
        assert_eq!(normalize(Some("text/plain"), &body), "345");
        assert_eq!(normalize(None, &body), "345");
    }

    #[test]
    fn test_opaque_body_used_verbatim() {
        let body = ResponseBody::Opaque("<response 200>".into());
        assert_eq!(normalize(None, &body), "<response 200>");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        // "è" is 0xC3 0xA8.
        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(b"{\"result\":\"caff\xC3".to_vec()),
            Chunk::Bytes(b"\xA8\"}".to_vec()),
        ]);
        assert_eq!(normalize(Some("application/json"), &body), "caff\u{e8}");

        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(b"data: citt\xC3".to_vec()),
            Chunk::Bytes(b"\xA0\n\n".to_vec()),
        ]);
        assert_eq!(normalize(Some("text/event-stream"), &body), "citt\u{e0}");
    }

    #[test]
    fn test_text_chunk_flushes_pending_bytes() {
        let body = ResponseBody::Chunks(vec![
            Chunk::Bytes(b"caff\xC3\xA8".to_vec()),
            Chunk::Text(" e ".into()),
            Chunk::Bytes(b"t\xC3".to_vec()),
            Chunk::Bytes(b"\xA8".to_vec()),
        ]);
        assert_eq!(body.concat(), "caff\u{e8} e t\u{e8}");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let body = ResponseBody::Chunks(vec![Chunk::Bytes(vec![0x61, 0xff, 0x62])]);
        assert_eq!(normalize(None, &body), "a\u{fffd}b");
    }

    #[test]
    fn test_raw_response_helpers() {
        let raw = RawResponse::json(&json!({"content": [{"text": "345"}]}));
        assert_eq!(raw.into_text(), "345");
        let raw = RawResponse::event_stream(["data: a", "", "data: b"]);
        assert_eq!(raw.into_text(), "a\nb");
    }
}
