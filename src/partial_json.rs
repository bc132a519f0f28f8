//! Incremental decoding of a JSON document that arrives in pieces
//!
//! The generation endpoint streams raw model output: a single JSON
//! document written left to right. At any moment the text received so far
//! is a prefix of valid JSON. [`PartialJsonDecoder`] accumulates bytes and
//! can produce a best-effort [`Value`] for the prefix by repairing it:
//!
//! - open strings are closed (an unfinished escape sequence is dropped)
//! - open arrays and objects are closed
//! - a dangling key, colon or trailing comma is cut off
//! - an unfinished number or literal (`tru`, `1e`) is cut off
//!
//! Nothing here knows about HTTP; the decoder is fed from whatever
//! transport the caller has.

use serde_json::Value;

use crate::errors::FlashgenError;
use crate::errors::Result;

/// Accumulates streamed bytes and decodes them on demand
#[derive(Debug, Default, Clone)]
pub struct PartialJsonDecoder {
    text: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    pending: Vec<u8>,
}

impl PartialJsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes
    pub fn push(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                    }
                }
            }
        }
    }

    /// Append already-decoded text
    pub fn push_str(&mut self, chunk: &str) {
        self.push(chunk.as_bytes());
    }

    /// Everything decoded so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.pending.is_empty()
    }

    /// Best-effort value for the text received so far. `None` until the
    /// prefix contains at least one decodable value.
    pub fn snapshot(&self) -> Option<Value> {
        parse_partial(&self.text)
    }

    /// Strict decode of the first complete value. Text after it is
    /// ignored, as it is by [`snapshot`](Self::snapshot).
    pub fn finalize(mut self) -> Result<Value> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.text.push_str(&String::from_utf8_lossy(&tail));
        }
        let mut values = serde_json::Deserializer::from_str(&self.text).into_iter::<Value>();
        match values.next() {
            Some(value) => Ok(value?),
            None => Err(FlashgenError::Stream(
                "stream ended before any JSON value".to_string(),
            )),
        }
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.pending.clear();
    }
}

/// Repair a JSON prefix and parse it
pub fn parse_partial(text: &str) -> Option<Value> {
    let repaired = repair(text)?;
    serde_json::from_str(&repaired).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A value is required (document start, after `:`, after `,` in an array)
    Value,
    /// Just after `[`
    ValueOrClose,
    /// Just after `{`
    KeyOrClose,
    /// After `,` in an object
    Key,
    Colon,
    CommaOrClose,
    /// Top-level value is complete, anything further is ignored
    End,
}

enum StringScan {
    /// Index one past the closing quote
    Complete(usize),
    /// Ran out of input; `cut` is where the usable content ends
    Open { cut: usize },
}

const LITERALS: [&str; 3] = ["true", "false", "null"];

/// Turn a JSON prefix into a complete document, or `None` if the prefix
/// has no usable value yet.
///
/// Scanning works on bytes: every structural character is ASCII and can
/// never occur inside a multi-byte UTF-8 sequence, so every cut position
/// is a char boundary.
pub fn repair(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut stack: Vec<Container> = Vec::new();
    let mut expect = Expect::Value;
    // Last position where appending closers yields valid JSON
    let mut safe: Option<(usize, Vec<Container>)> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        match expect {
            Expect::Value | Expect::ValueOrClose => match b {
                b']' if expect == Expect::ValueOrClose => {
                    stack.pop();
                    i += 1;
                    expect = after_value(&stack);
                    safe = Some((i, stack.clone()));
                }
                b'{' => {
                    stack.push(Container::Object);
                    i += 1;
                    expect = Expect::KeyOrClose;
                    safe = Some((i, stack.clone()));
                }
                b'[' => {
                    stack.push(Container::Array);
                    i += 1;
                    expect = Expect::ValueOrClose;
                    safe = Some((i, stack.clone()));
                }
                b'"' => match scan_string(bytes, i) {
                    StringScan::Complete(end) => {
                        i = end;
                        expect = after_value(&stack);
                        safe = Some((i, stack.clone()));
                    }
                    StringScan::Open { cut } => {
                        let mut out = String::with_capacity(cut + stack.len() + 1);
                        out.push_str(&text[..cut]);
                        out.push('"');
                        push_closers(&mut out, &stack);
                        return Some(out);
                    }
                },
                b'-' | b'0'..=b'9' => {
                    let end = scan_number(bytes, i);
                    if end == bytes.len() {
                        // the number may still be growing
                        if is_complete_number(&text[i..end]) {
                            let mut out = text[..end].to_string();
                            push_closers(&mut out, &stack);
                            return Some(out);
                        }
                        break;
                    }
                    i = end;
                    expect = after_value(&stack);
                    safe = Some((i, stack.clone()));
                }
                b't' | b'f' | b'n' => {
                    let rest = &bytes[i..];
                    match LITERALS.iter().find(|lit| rest.starts_with(lit.as_bytes())) {
                        Some(lit) => {
                            i += lit.len();
                            expect = after_value(&stack);
                            safe = Some((i, stack.clone()));
                        }
                        None => break,
                    }
                }
                _ => break,
            },
            Expect::KeyOrClose | Expect::Key => match b {
                b'}' if expect == Expect::KeyOrClose => {
                    stack.pop();
                    i += 1;
                    expect = after_value(&stack);
                    safe = Some((i, stack.clone()));
                }
                b'"' => match scan_string(bytes, i) {
                    StringScan::Complete(end) => {
                        i = end;
                        expect = Expect::Colon;
                    }
                    StringScan::Open { .. } => break,
                },
                _ => break,
            },
            Expect::Colon => {
                if b != b':' {
                    break;
                }
                i += 1;
                expect = Expect::Value;
            }
            Expect::CommaOrClose => match (b, stack.last()) {
                (b',', Some(Container::Object)) => {
                    i += 1;
                    expect = Expect::Key;
                }
                (b',', Some(Container::Array)) => {
                    i += 1;
                    expect = Expect::Value;
                }
                (b'}', Some(Container::Object)) | (b']', Some(Container::Array)) => {
                    stack.pop();
                    i += 1;
                    expect = after_value(&stack);
                    safe = Some((i, stack.clone()));
                }
                _ => break,
            },
            Expect::End => break,
        }
    }

    safe.map(|(pos, open)| {
        let mut out = text[..pos].to_string();
        push_closers(&mut out, &open);
        out
    })
}

fn after_value(stack: &[Container]) -> Expect {
    if stack.is_empty() {
        Expect::End
    } else {
        Expect::CommaOrClose
    }
}

fn push_closers(out: &mut String, stack: &[Container]) {
    for container in stack.iter().rev() {
        out.push(match container {
            Container::Object => '}',
            Container::Array => ']',
        });
    }
}

fn scan_string(bytes: &[u8], start: usize) -> StringScan {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                let width = if bytes.get(j + 1) == Some(&b'u') { 6 } else { 2 };
                if j + width > bytes.len() {
                    return StringScan::Open { cut: j };
                }
                j += width;
            }
            b'"' => return StringScan::Complete(j + 1),
            _ => j += 1,
        }
    }
    StringScan::Open { cut: bytes.len() }
}

fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && matches!(bytes[j], b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') {
        j += 1;
    }
    j
}

fn is_complete_number(candidate: &str) -> bool {
    candidate.ends_with(|c: char| c.is_ascii_digit())
        && serde_json::from_str::<serde_json::Number>(candidate).is_ok()
}
