//! Incremental parser for the chat gateway's server-sent events.
//!
//! The gateway streams OpenAI-style chunks:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Network chunks can split lines, JSON payloads and even UTF-8 sequences
//! anywhere, so the parser buffers until it has whole lines. A `data:` line
//! whose JSON does not parse is joined with the next line once; if that fails
//! too it is dropped and the stream carries on.

use serde_json::Value;

/// One parsed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A piece of assistant text
    Delta(String),
    /// The stream finished
    Done,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    /// A `data:` payload that did not parse on its own line
    held: Option<String>,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes from the network.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);
        let text = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                text
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete sequence at the end: keep it for the next chunk
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                text
            }
        };
        self.push(&text)
    }

    /// Feed decoded text.
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        self.drain_lines(false)
    }

    /// Process whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.buffer.push_str(&rest);
        }
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, final_pass: bool) -> Vec<SseEvent> {
        let mut events = Vec::new();
        while !self.done {
            let Some(newline) = self.buffer.find('\n') else {
                break;
            };
            let raw: String = self.buffer.drain(..=newline).collect();
            let line = raw.trim_end_matches('\n').trim_end_matches('\r');

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let is_data = line.starts_with("data:");
            let data = match line.strip_prefix("data:") {
                Some(data) => data.strip_prefix(' ').unwrap_or(data).trim(),
                None if self.held.is_some() => line.trim(),
                None => continue,
            };

            if data == "[DONE]" {
                self.drop_held();
                self.done = true;
                events.push(SseEvent::Done);
                break;
            }

            // A held payload gets exactly one more line to complete itself
            if let Some(held) = self.held.take() {
                match parse_delta(&format!("{}{}", held, data)) {
                    Ok(delta) => {
                        events.extend(delta.map(SseEvent::Delta));
                        continue;
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping unparseable event"),
                }
                if !is_data {
                    continue;
                }
            }

            match parse_delta(data) {
                Ok(delta) => events.extend(delta.map(SseEvent::Delta)),
                Err(_) if !final_pass => self.held = Some(data.to_string()),
                Err(e) => tracing::warn!(error = %e, "dropping unparseable event at end of stream"),
            }
        }
        if final_pass {
            self.drop_held();
        }
        events
    }

    fn drop_held(&mut self) {
        if let Some(held) = self.held.take() {
            tracing::warn!(chars = held.len(), "dropping incomplete event");
        }
    }
}

/// Text of `choices[0].delta.content`, if any.
fn parse_delta(data: &str) -> Result<Option<String>, serde_json::Error> {
    let json: Value = serde_json::from_str(data)?;
    Ok(json
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string))
}
