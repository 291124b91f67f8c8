//! SSE decoding for `streamGenerateContent?alt=sse`
//!
//! Each `data:` event carries a full `GenerateContentResponse` holding only
//! the newly generated text. The stream ends when the connection closes.

use eventsource_stream::{EventStream, Eventsource};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, trace};

use crate::error::GeminiError;
use crate::types::{ApiErrorEnvelope, GenerateContentResponse};
use crate::Result;

/// Lazy, ordered, single-pass sequence of text fragments
pub type TextStream = BoxStream<'static, Result<String>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error(ApiErrorEnvelope),
    Response(GenerateContentResponse),
}

struct StreamState<S> {
    events: Pin<Box<EventStream<S>>>,
    idle_timeout: Duration,
    chunks: usize,
    done: bool,
}

/// Turn a raw SSE byte stream into text chunks.
///
/// The first error ends the stream; nothing is yielded after it.
pub fn text_stream<S, B, E>(bytes: S, idle_timeout: Duration) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = StreamState {
        events: Box::pin(bytes.eventsource()),
        idle_timeout,
        chunks: 0,
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.done {
                return None;
            }

            let event = match timeout(st.idle_timeout, st.events.next()).await {
                Ok(Some(Ok(event))) => event,
                Ok(None) => {
                    debug!(chunks = st.chunks, "SSE stream closed");
                    return None;
                }
                Ok(Some(Err(e))) => {
                    error!("SSE error after {} chunks: {}", st.chunks, e);
                    st.done = true;
                    return Some((Err(GeminiError::Stream(e.to_string())), st));
                }
                Err(_) => {
                    error!("SSE idle timeout after {} chunks", st.chunks);
                    st.done = true;
                    let idle = st.idle_timeout;
                    return Some((Err(GeminiError::IdleTimeout(idle)), st));
                }
            };

            trace!("Gemini SSE: {:?}", event);
            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }

            match decode_payload(data) {
                Ok(Some(text)) => {
                    st.chunks += 1;
                    return Some((Ok(text), st));
                }
                Ok(None) => continue,
                Err(e) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
            }
        }
    })
    .boxed()
}

/// Decode one SSE payload. `Ok(None)` means the event carried no text.
fn decode_payload(data: &str) -> Result<Option<String>> {
    match serde_json::from_str::<StreamPayload>(data)? {
        StreamPayload::Error(envelope) => {
            let status = envelope.error.code.unwrap_or(500);
            Err(GeminiError::from_api_body(status, envelope.error))
        }
        StreamPayload::Response(response) => {
            if let Some(reason) = response.block_reason() {
                return Err(GeminiError::Blocked(reason));
            }
            Ok(response.text().filter(|text| !text.is_empty()))
        }
    }
}
