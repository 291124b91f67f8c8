//! Scripted in-memory backend for tests

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

use crate::backend::{BackendError, ChunkStream, ModelBackend, ModelRequest};

/// Scripted outcome of one `stream_generate` call
#[derive(Debug, Clone)]
pub enum Reply {
    Chunks(Vec<String>),
    ChunksThenError(Vec<String>, BackendError),
    Fail(BackendError),
}

impl Reply {
    pub fn chunks(chunks: &[&str]) -> Self {
        Reply::Chunks(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn chunks_then_error(chunks: &[&str], error: BackendError) -> Self {
        Reply::ChunksThenError(chunks.iter().map(|c| c.to_string()).collect(), error)
    }
}

/// Queued `generate` answer, optionally held until released
struct Extraction {
    outcome: Result<String, BackendError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Backend that replays queued answers and records every request
#[derive(Default)]
pub struct ScriptedBackend {
    extractions: Mutex<VecDeque<Extraction>>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
    generate_calls: Mutex<usize>,
    stream_calls: Mutex<usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_extraction(&self, outcome: Result<String, BackendError>) {
        self.extractions.lock().push_back(Extraction {
            outcome,
            gate: None,
        });
    }

    /// Queue an answer that `generate` only returns once the sender fires
    /// (or is dropped).
    pub fn push_gated_extraction(
        &self,
        outcome: Result<String, BackendError>,
    ) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.extractions.lock().push_back(Extraction {
            outcome,
            gate: Some(gate),
        });
        release
    }

    pub fn push_reply(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    pub fn generate_calls(&self) -> usize {
        *self.generate_calls.lock()
    }

    pub fn stream_calls(&self) -> usize {
        *self.stream_calls.lock()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError> {
        *self.generate_calls.lock() += 1;
        self.requests.lock().push(request);
        let next = self.extractions.lock().pop_front();
        let Some(extraction) = next else {
            return Err(BackendError::Upstream("no scripted extraction".into()));
        };
        if let Some(gate) = extraction.gate {
            let _ = gate.await;
        }
        extraction.outcome
    }

    async fn stream_generate(&self, request: ModelRequest) -> Result<ChunkStream, BackendError> {
        *self.stream_calls.lock() += 1;
        self.requests.lock().push(request);
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(BackendError::Upstream("no scripted reply".into())));

        match reply {
            Reply::Chunks(chunks) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            Reply::ChunksThenError(chunks, error) => Ok(stream::iter(
                chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error))),
            )
            .boxed()),
            Reply::Fail(error) => Err(error),
        }
    }
}

/// A valid six-axiom extraction answer
pub fn sample_axioms_json() -> String {
    let items: Vec<serde_json::Value> = (1..=6)
        .map(|i| {
            serde_json::json!({
                "axiom": format!("Pillar {i}"),
                "definition": format!("Explanation of pillar {i}.")
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}
