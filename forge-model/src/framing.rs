//! Normalizes vendor chunk framing (server-sent events, NDJSON) into text fragments.

use crate::http::transport_error;
use eventsource_stream::{EventStreamError, Eventsource};
use forge_core::{ForgeError, Result, TokenStream};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// Server-sent events; each event's `data` is one payload.
    Sse,
    /// One JSON document per line.
    Ndjson,
}

/// What one decoded payload contributes to the token stream.
#[derive(Debug, PartialEq)]
pub(crate) enum Chunk {
    Text(String),
    /// Trailing text after which the vendor signals completion.
    Final(String),
    Skip,
    Done,
}

/// Splits a byte stream into complete lines without breaking multi-byte characters.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub(crate) fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(position) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=position).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    pub(crate) fn take_rest(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

fn sse_payloads(
    response: reqwest::Response,
    vendor: &'static str,
) -> BoxStream<'static, Result<String>> {
    response
        .bytes_stream()
        .eventsource()
        .map(move |event| match event {
            Ok(event) => Ok(event.data),
            Err(EventStreamError::Transport(e)) => Err(transport_error(vendor, "stream read", e)),
            Err(e) => Err(ForgeError::Provider(format!("{vendor} sent a malformed event: {e}"))),
        })
        .boxed()
}

fn ndjson_payloads(
    response: reqwest::Response,
    vendor: &'static str,
) -> impl Stream<Item = Result<String>> + Send + 'static {
    async_stream::try_stream! {
        let mut bytes = response.bytes_stream();
        let mut buffer = LineBuffer::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| transport_error(vendor, "stream read", e))?;
            buffer.push(&chunk);
            for line in buffer.drain_lines() {
                yield line;
            }
        }
        if let Some(rest) = buffer.take_rest() {
            yield rest;
        }
    }
}

/// Wrap a successful HTTP response into a lazy fragment stream.
///
/// `extract` decodes one payload. The response body is only read as the stream is polled, so
/// dropping the stream cancels the request.
pub(crate) fn token_stream<F>(
    response: reqwest::Response,
    framing: Framing,
    vendor: &'static str,
    extract: F,
) -> TokenStream
where
    F: Fn(&str) -> Result<Chunk> + Send + 'static,
{
    let mut payloads = match framing {
        Framing::Sse => sse_payloads(response, vendor),
        Framing::Ndjson => ndjson_payloads(response, vendor).boxed(),
    };

    let stream = async_stream::try_stream! {
        while let Some(payload) = payloads.next().await {
            let payload = payload?;
            if payload.trim().is_empty() {
                continue;
            }
            match extract(&payload)? {
                Chunk::Text(text) => {
                    if !text.is_empty() {
                        yield text;
                    }
                }
                Chunk::Final(text) => {
                    if !text.is_empty() {
                        yield text;
                    }
                    break;
                }
                Chunk::Done => break,
                Chunk::Skip => {}
            }
        }
    };
    Box::pin(stream)
}
