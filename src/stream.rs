/*!
 * Streamed response decoding.
 *
 * `StreamDecoder` turns raw body bytes into JSON frames:
 * - bytes are decoded as UTF-8, holding back a multi-byte sequence split across reads
 * - text is cut into `\n`-terminated lines; a partial line waits for the next read
 * - with SSE framing only `data: ` lines are frames, and `[DONE]` ends the stream
 * - with NDJSON framing every non-blank line is a frame
 * - payloads that are not valid JSON are skipped
 *
 * `decode_stream` drives a decoder over an async byte stream and feeds each
 * frame through the provider's normalizer into an `EventEmitter`.
 */

use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::trace;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::task::EventEmitter;

/// Prefix marking an SSE data line
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates a stream before the connection closes
pub const DONE_SENTINEL: &str = "[DONE]";

/// Line framing used by a provider's streaming body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Server-sent events, `data: <json>` lines
    #[default]
    Sse,
    /// One JSON object per line
    NdJson,
}

/// One decoded unit of a stream
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A parsed JSON payload
    Payload(Value),
    /// The termination sentinel
    End,
}

/// Incremental line decoder for streamed response bodies
#[derive(Debug, Default)]
pub struct StreamDecoder {
    framing: Framing,
    /// Undecoded tail of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    line_buffer: String,
    finished: bool,
}

impl StreamDecoder {
    /// Create a decoder for the given framing
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            ..Default::default()
        }
    }

    /// Whether the termination sentinel has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed the next chunk of body bytes
    ///
    /// Returns the frames completed by this chunk. After `Frame::End` has been
    /// returned, further input is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        if self.finished {
            return Vec::new();
        }

        self.pending.extend_from_slice(bytes);
        self.decode_pending();
        self.drain_lines()
    }

    /// Flush what is left at end of body
    ///
    /// A trailing line without a newline is still treated as a line.
    pub fn finish(&mut self) -> Vec<Frame> {
        if self.finished {
            return Vec::new();
        }

        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.line_buffer.push_str(&String::from_utf8_lossy(&tail));
        }

        let mut frames = self.drain_lines();
        if !self.finished && !self.line_buffer.is_empty() {
            let line = std::mem::take(&mut self.line_buffer);
            if let Some(frame) = self.parse_line(&line) {
                if frame == Frame::End {
                    self.finished = true;
                }
                frames.push(frame);
            }
        }
        frames
    }

    /// Move every complete UTF-8 sequence from `pending` into `line_buffer`
    fn decode_pending(&mut self) {
        let mut consumed = 0;
        loop {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.line_buffer.push_str(text);
                    consumed = self.pending.len();
                    break;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    self.line_buffer.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match error.error_len() {
                        Some(invalid) => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid + invalid;
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more bytes
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..consumed);
    }

    fn drain_lines(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(newline) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=newline).collect();
            let Some(frame) = self.parse_line(&line) else {
                continue;
            };

            if frame == Frame::End {
                self.finished = true;
                self.line_buffer.clear();
                self.pending.clear();
                frames.push(frame);
                break;
            }
            frames.push(frame);
        }
        frames
    }

    fn parse_line(&self, line: &str) -> Option<Frame> {
        let line = line.trim_end_matches(['\n', '\r']);

        let payload = match self.framing {
            Framing::Sse => line.strip_prefix(DATA_PREFIX)?,
            Framing::NdJson => line.strip_prefix(DATA_PREFIX).unwrap_or(line),
        };
        let payload = payload.trim();

        if payload == DONE_SENTINEL {
            return Some(Frame::End);
        }
        if payload.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Some(Frame::Payload(value)),
            Err(e) => {
                trace!("Skipping non-JSON stream frame: {}", e);
                None
            }
        }
    }
}

/// Decode a streamed body and emit normalized events
///
/// Emits a `Chunk` for every frame with non-empty text and `Done` on the
/// sentinel, on a provider's final frame, or at end of body. The body stream
/// is owned here and dropped on every return path, which releases the
/// underlying connection.
///
/// # Returns
/// * `Err(ProviderError::StreamError)` - reading the body failed; nothing terminal was emitted
pub async fn decode_stream<S, E>(
    body: S,
    provider: &dyn Provider,
    emitter: &mut EventEmitter,
) -> Result<(), ProviderError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut body = pin!(body);
    let mut decoder = StreamDecoder::new(provider.framing());

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| ProviderError::StreamError(e.to_string()))?;
        if emit_frames(decoder.feed(&chunk), provider, emitter) {
            return Ok(());
        }
    }

    emit_frames(decoder.finish(), provider, emitter);
    emitter.done();
    Ok(())
}

/// Emit events for decoded frames; returns true once the stream has ended
fn emit_frames(frames: Vec<Frame>, provider: &dyn Provider, emitter: &mut EventEmitter) -> bool {
    for frame in frames {
        match frame {
            Frame::End => {
                emitter.done();
                return true;
            }
            Frame::Payload(payload) => {
                emitter.chunk(provider.extract_text(&payload));
                if provider.is_final_frame(&payload) {
                    emitter.done();
                    return true;
                }
            }
        }
    }
    false
}
