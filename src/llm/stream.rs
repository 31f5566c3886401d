//! Server-sent-event response handling for chat completions.
//!
//! [`ChatClient::complete_if_cache`](super::ChatClient::complete_if_cache)
//! always disables streaming, so nothing in the request path reaches this
//! module yet. It is kept ready for a streaming entry point.

use crate::error::{AdapterError, ClassifiedError, ErrorKind, Result};
use crate::text::{decode_unicode_escapes, extract_first_json_object};
use crate::usage::{record_usage, UsageTracker};
use async_stream::try_stream;
use futures::{Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, error};

/// Boxed stream of text lines or fragments
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Split a streaming HTTP body into lines
pub fn lines_from_response(response: reqwest::Response) -> TextStream {
    let bytes = response.bytes_stream().map_err(io::Error::other);
    let lines = FramedRead::new(StreamReader::new(bytes), LinesCodec::new()).map_err(|e| {
        error!("Failed to read streaming response: {}", e);
        AdapterError::from(ClassifiedError::new(ErrorKind::ConnectionFailed, e.to_string()))
    });
    Box::pin(lines)
}

/// Turn SSE lines into reply fragments.
///
/// Each `data: ` line carrying `choices[0].delta.content` yields that fragment;
/// `data: [DONE]` ends the stream and unparsable lines are skipped. With
/// `keyword_extraction`, one final fragment holds the JSON object extracted
/// from the whole accumulated reply.
pub fn stream_response<S>(
    mut lines: S,
    tracker: Option<Arc<dyn UsageTracker>>,
    keyword_extraction: bool,
) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = Result<String>> + Unpin + Send + 'static,
{
    try_stream! {
        let mut collected = String::new();

        while let Some(line) = lines.next().await {
            let line = line?;
            let line = line.trim();

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };

            if data == "[DONE]" {
                break;
            }

            let chunk: Value = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!("Skipping malformed stream line: {} - {}", e, data);
                    continue;
                }
            };

            if let Some(err) = chunk.get("error") {
                error!("Streaming error: {}", err);
                Err::<(), _>(ClassifiedError::malformed(format!("Streaming error: {}", err)))?;
            }

            let delta = chunk
                .pointer("/choices/0/delta/content")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());

            if let Some(fragment) = delta {
                let fragment = if fragment.contains("\\u") {
                    decode_unicode_escapes(fragment.as_bytes())
                } else {
                    fragment.to_string()
                };
                collected.push_str(&fragment);
                yield fragment;
            }

            record_usage(tracker.as_deref(), chunk.get("usage"));
        }

        if keyword_extraction && !collected.is_empty() {
            yield extract_first_json_object(&collected).unwrap_or(collected);
        }
    }
}

/// Stream the fragments of a `stream: true` chat response
pub fn handle_streaming_response(
    response: reqwest::Response,
    tracker: Option<Arc<dyn UsageTracker>>,
    keyword_extraction: bool,
) -> TextStream {
    Box::pin(stream_response(lines_from_response(response), tracker, keyword_extraction))
}
