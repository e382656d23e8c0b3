//! Consumer for newline-delimited JSON generation streams.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GenerationError;

/// One line of a streaming generate response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Accumulates `response` fragments in arrival order.
///
/// Bytes are buffered across chunk boundaries, so a line (or a multi-byte
/// character) split between two network reads is decoded once complete.
/// Lines that are not valid UTF-8 JSON are skipped.
#[derive(Debug, Default)]
pub struct ChunkConsumer {
    buffer: Vec<u8>,
    output: String,
    lines: usize,
    skipped: usize,
}

impl ChunkConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; every completed line is processed immediately.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let line = self.buffer[start..end].to_vec();
            self.process_line(&line);
            start = end + 1;
        }
        self.buffer.drain(..start);
    }

    /// Process any unterminated trailing line and return the text.
    pub fn finish(mut self) -> String {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&line);
        }
        debug!(
            "Generation stream done: {} lines, {} skipped, {} chars",
            self.lines,
            self.skipped,
            self.output.len()
        );
        self.output
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn process_line(&mut self, line: &[u8]) {
        let line = match std::str::from_utf8(line) {
            Ok(s) => s.trim(),
            Err(e) => {
                warn!(error = %e, "Invalid UTF-8 in generation stream, skipping line");
                self.skipped += 1;
                return;
            }
        };
        if line.is_empty() {
            return;
        }
        self.lines += 1;

        match serde_json::from_str::<GenerateChunk>(line) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    warn!(error = %error, "Generation endpoint reported an error in stream");
                }
                if let Some(fragment) = chunk.response {
                    self.output.push_str(&fragment);
                }
            }
            Err(e) => {
                warn!(error = %e, "Malformed generation chunk, skipping line");
                self.skipped += 1;
            }
        }
    }
}

/// Drain a byte stream through a [`ChunkConsumer`].
///
/// A transport error from the stream ends consumption with
/// [`GenerationError::Stream`].
pub async fn consume_stream<S, B, E>(stream: S) -> Result<String, GenerationError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut consumer = ChunkConsumer::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| GenerationError::Stream(e.to_string()))?;
        consumer.push(bytes.as_ref());
    }

    Ok(consumer.finish())
}
