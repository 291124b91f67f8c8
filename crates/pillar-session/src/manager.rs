//! Session Manager
//!
//! Owns the single session slot and mediates every call to the model.
//!
//! ```text
//! Uninitialized --initialize ok--> Active --reset--> Uninitialized
//! ```
//!
//! A failed `initialize` always leaves the slot `Uninitialized`. Each
//! initialize or reset bumps a generation counter; reply streams compare
//! against it so chunks for a cleared session are dropped.

use futures_util::stream::{Stream, StreamExt};
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::axiom::{axiom_schema, parse_axioms, Axiom};
use crate::backend::{ChunkStream, ModelBackend, ModelRequest};
use crate::document::Document;
use crate::error::SessionError;
use crate::language::Language;
use crate::prompts;
use crate::session::{extraction_turn, ActiveSession, SessionInfo, SessionState};
use crate::Result;

#[derive(Default)]
struct Slot {
    active: Option<ActiveSession>,
    generation: u64,
    /// Id of the request currently in flight
    in_flight: Option<u64>,
    next_flight: u64,
}

impl Slot {
    fn begin_flight(&mut self) -> Result<u64> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        self.next_flight += 1;
        self.in_flight = Some(self.next_flight);
        Ok(self.next_flight)
    }
}

/// Clears the in-flight marker when the owning request finishes or is dropped
struct FlightGuard {
    slot: Arc<RwLock<Slot>>,
    id: u64,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.write();
        if slot.in_flight == Some(self.id) {
            slot.in_flight = None;
        }
    }
}

pub struct SessionManager {
    backend: Arc<dyn ModelBackend>,
    slot: Arc<RwLock<Slot>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            slot: Arc::new(RwLock::new(Slot::default())),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.slot.read().active.is_some() {
            SessionState::Active
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// True while an initialize call or reply stream is outstanding
    pub fn is_busy(&self) -> bool {
        self.slot.read().in_flight.is_some()
    }

    pub fn axioms(&self) -> Option<Vec<Axiom>> {
        self.slot.read().active.as_ref().map(|s| s.axioms.clone())
    }

    pub fn document(&self) -> Option<Document> {
        self.slot.read().active.as_ref().map(|s| s.document.clone())
    }

    pub fn language(&self) -> Option<Language> {
        self.slot.read().active.as_ref().map(|s| s.language)
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.slot.read().active.as_ref().map(ActiveSession::info)
    }

    /// Number of turns in the grounding context (0 when uninitialized)
    pub fn history_len(&self) -> usize {
        self.slot
            .read()
            .active
            .as_ref()
            .map_or(0, ActiveSession::history_len)
    }

    /// Extract axioms from `document` and bind a new session to it.
    ///
    /// Any previous session is discarded first.
    pub async fn initialize(&self, document: Document, language: Language) -> Result<Vec<Axiom>> {
        let flight = {
            let mut slot = self.slot.write();
            let id = slot.begin_flight()?;
            if let Some(previous) = slot.active.take() {
                tracing::info!(session_id = %previous.id, "Discarding session before re-initialize");
            }
            slot.generation += 1;
            FlightGuard {
                slot: Arc::clone(&self.slot),
                id,
            }
        };

        tracing::info!(
            document = %document.name(),
            fingerprint = %document.short_fingerprint(),
            bytes = document.byte_len(),
            language = %language,
            "Extracting axioms"
        );

        let request = ModelRequest {
            system_instruction: prompts::system_instruction(language),
            turns: vec![extraction_turn(&document, language)],
            response_schema: Some(axiom_schema()),
        };

        let outcome = match self.backend.generate(request).await {
            Ok(raw) => parse_axioms(&raw).map(|axioms| (axioms, raw)),
            Err(e) => Err(SessionError::from(e)),
        };

        let (axioms, raw) = match outcome {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(document = %document.name(), "Initialization failed: {}", e);
                return Err(e);
            }
        };

        let mut slot = self.slot.write();
        if slot.in_flight != Some(flight.id) {
            // reset() ran while the extraction was outstanding
            tracing::info!(document = %document.name(), "Session reset during extraction; discarding result");
            return Err(SessionError::NotInitialized);
        }

        let session = ActiveSession::new(document, language, axioms.clone(), &raw);
        tracing::info!(
            session_id = %session.id,
            document = %session.document.name(),
            axioms = axioms.len(),
            "Session initialized"
        );
        slot.active = Some(session);
        drop(slot);
        drop(flight);

        Ok(axioms)
    }

    /// Send `text` and return the reply as a lazy chunk stream.
    pub async fn query(&self, text: &str) -> Result<ReplyStream> {
        let text = text.trim();

        let (request, generation, flight) = {
            let mut slot = self.slot.write();
            let request = match slot.active.as_ref() {
                Some(session) => session.request_for(text),
                None => {
                    tracing::error!("Query attempted without an active session");
                    return Err(SessionError::NotInitialized);
                }
            };
            if text.is_empty() {
                return Err(SessionError::EmptyQuery);
            }
            let id = slot.begin_flight()?;
            let flight = FlightGuard {
                slot: Arc::clone(&self.slot),
                id,
            };
            (request, slot.generation, flight)
        };

        tracing::debug!(turns = request.turns.len(), "Sending query");

        let inner = self.backend.stream_generate(request).await.map_err(|e| {
            tracing::warn!("Query rejected upstream: {}", e);
            SessionError::from(e)
        })?;

        Ok(ReplyStream {
            inner,
            slot: Arc::clone(&self.slot),
            generation,
            query: text.to_string(),
            reply: String::new(),
            chunks: 0,
            flight: Some(flight),
        })
    }

    /// Drop session and document. Idempotent.
    pub fn reset(&self) {
        let mut slot = self.slot.write();
        if let Some(session) = slot.active.take() {
            tracing::info!(
                session_id = %session.id,
                document = %session.document.name(),
                "Session reset"
            );
        }
        slot.generation += 1;
        slot.in_flight = None;
    }
}

/// Reply to one query.
///
/// Yields chunks in emission order and ends after the upstream stream ends,
/// after the first error, or as soon as the owning session is reset. The
/// exchange is committed to the session history only on normal completion.
pub struct ReplyStream {
    inner: ChunkStream,
    slot: Arc<RwLock<Slot>>,
    generation: u64,
    query: String,
    reply: String,
    chunks: usize,
    flight: Option<FlightGuard>,
}

impl ReplyStream {
    /// Text received so far
    pub fn text(&self) -> &str {
        &self.reply
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn is_finished(&self) -> bool {
        self.flight.is_none()
    }

    fn is_current(&self) -> bool {
        let slot = self.slot.read();
        slot.generation == self.generation && slot.active.is_some()
    }

    fn commit(&mut self) {
        if self.reply.is_empty() {
            tracing::warn!("Reply stream ended without text; exchange not recorded");
            return;
        }

        let mut slot = self.slot.write();
        if slot.generation != self.generation {
            return;
        }
        if let Some(session) = slot.active.as_mut() {
            session.commit(&self.query, std::mem::take(&mut self.reply));
            tracing::debug!(
                session_id = %session.id,
                chunks = self.chunks,
                "Exchange committed"
            );
        }
    }

    fn finish(&mut self) {
        self.flight = None;
    }
}

impl Stream for ReplyStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.is_finished() {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                if !this.is_current() {
                    tracing::debug!("Discarding chunk for a cleared session");
                    this.finish();
                    return Poll::Ready(None);
                }
                this.reply.push_str(&chunk);
                this.chunks += 1;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(chunks = this.chunks, "Reply stream failed: {}", e);
                this.finish();
                Poll::Ready(Some(Err(SessionError::from(e))))
            }
            Poll::Ready(None) => {
                this.commit();
                this.finish();
                Poll::Ready(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, Role, TurnPart};
    use crate::testing::{sample_axioms_json, Reply, ScriptedBackend};

    fn document() -> Document {
        Document::from_bytes("treatise.pdf", b"%PDF-1.7 test body")
    }

    fn manager(backend: &Arc<ScriptedBackend>) -> SessionManager {
        SessionManager::new(Arc::clone(backend) as Arc<dyn ModelBackend>)
    }

    async fn active_manager(backend: &Arc<ScriptedBackend>) -> SessionManager {
        backend.push_extraction(Ok(sample_axioms_json()));
        let manager = manager(backend);
        manager.initialize(document(), Language::En).await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_initialize_success() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Ok(sample_axioms_json()));
        let manager = manager(&backend);

        assert_eq!(manager.state(), SessionState::Uninitialized);
        let axioms = manager.initialize(document(), Language::Ar).await.unwrap();

        assert_eq!(axioms.len(), 6);
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.axioms().unwrap(), axioms);
        assert_eq!(manager.language(), Some(Language::Ar));
        assert_eq!(manager.history_len(), 2);
        assert!(!manager.is_busy());

        let request = &backend.requests()[0];
        assert!(request.response_schema.is_some());
        assert!(request.system_instruction.contains("Arabic"));
        assert!(request.turns[0].has_document());
    }

    #[tokio::test]
    async fn test_initialize_fenced_response() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Ok(format!("```json\n{}\n```", sample_axioms_json())));
        let manager = manager(&backend);

        let axioms = manager.initialize(document(), Language::En).await.unwrap();
        assert_eq!(axioms.len(), 6);
        assert!(manager.is_active());
    }

    #[tokio::test]
    async fn test_initialize_malformed() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Ok("Here are the axioms you asked for!".to_string()));
        let manager = manager(&backend);

        let err = manager.initialize(document(), Language::En).await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedResponse(_)));
        assert_eq!(manager.state(), SessionState::Uninitialized);
        assert!(manager.axioms().is_none());
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_initialize_auth_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Err(BackendError::Unauthenticated(
            "API key not valid".to_string(),
        )));
        let manager = manager(&backend);

        let err = manager.initialize(document(), Language::En).await.unwrap_err();
        assert!(err.requires_authentication());
        assert_eq!(manager.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_failed_reinitialize_discards_previous() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;

        backend.push_extraction(Err(BackendError::Upstream("timeout".to_string())));
        let err = manager.initialize(document(), Language::En).await.unwrap_err();

        assert_eq!(err, SessionError::Upstream("timeout".to_string()));
        assert_eq!(manager.state(), SessionState::Uninitialized);
    }

    /// Yield until `initialize` has parked inside the backend
    async fn until_busy(manager: &SessionManager) {
        while !manager.is_busy() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_reset_during_extraction_discards_result() {
        let backend = Arc::new(ScriptedBackend::new());
        let release = backend.push_gated_extraction(Ok(sample_axioms_json()));
        let manager = manager(&backend);

        let (result, ()) = tokio::join!(manager.initialize(document(), Language::En), async {
            until_busy(&manager).await;
            manager.reset();
            release.send(()).unwrap();
        });

        assert_eq!(result.unwrap_err(), SessionError::NotInitialized);
        assert_eq!(manager.state(), SessionState::Uninitialized);
        assert!(manager.axioms().is_none());
        assert_eq!(manager.history_len(), 0);
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_reinitialize_after_reset_wins_over_stale_extraction() {
        let backend = Arc::new(ScriptedBackend::new());
        let release = backend.push_gated_extraction(Ok(sample_axioms_json()));
        backend.push_extraction(Ok(sample_axioms_json()));
        let manager = manager(&backend);
        let replacement = Document::from_bytes("replacement.pdf", b"%PDF-1.7 other body");

        let (stale, fresh) = tokio::join!(manager.initialize(document(), Language::En), async {
            until_busy(&manager).await;
            manager.reset();
            let fresh = manager.initialize(replacement, Language::Ar).await;
            release.send(()).unwrap();
            fresh
        });

        assert_eq!(stale.unwrap_err(), SessionError::NotInitialized);
        assert_eq!(fresh.unwrap().len(), 6);
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.document().unwrap().name(), "replacement.pdf");
        assert_eq!(manager.language(), Some(Language::Ar));
        assert_eq!(manager.history_len(), 2);
        assert!(!manager.is_busy());
        assert_eq!(backend.generate_calls(), 2);
    }

    #[tokio::test]
    async fn test_query_uninitialized() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = manager(&backend);

        let err = manager.query("hello").await.err().unwrap();
        assert_eq!(err, SessionError::NotInitialized);
        assert_eq!(backend.stream_calls(), 0);
    }

    #[tokio::test]
    async fn test_query_empty() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;

        let err = manager.query("   ").await.err().unwrap();
        assert_eq!(err, SessionError::EmptyQuery);
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_query_streams_and_commits() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        backend.push_reply(Reply::chunks(&["Hel", "lo"]));

        let mut stream = manager.query("Greet me").await.unwrap();
        assert!(manager.is_busy());

        let mut received = Vec::new();
        while let Some(chunk) = stream.next().await {
            received.push(chunk.unwrap());
        }

        assert_eq!(received, vec!["Hel", "lo"]);
        assert_eq!(received.concat(), "Hello");
        assert!(!manager.is_busy());
        assert_eq!(manager.history_len(), 4);
        assert_eq!(manager.session_info().unwrap().exchanges, 1);

        // The follow-up carries the committed exchange without re-sending the document
        backend.push_reply(Reply::chunks(&["again"]));
        let stream = manager.query("And again").await.unwrap();
        let _: Vec<_> = stream.collect().await;

        let follow_up = backend.requests().last().cloned().unwrap();
        assert_eq!(follow_up.turns.len(), 5);
        assert_eq!(
            follow_up
                .turns
                .iter()
                .filter(|turn| turn.has_document())
                .count(),
            1
        );
        assert_eq!(follow_up.turns[3].role, Role::Model);
        assert_eq!(
            follow_up.turns[3].parts,
            vec![TurnPart::Text("Hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_query_busy() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        backend.push_reply(Reply::chunks(&["one"]));

        let first = manager.query("first").await.unwrap();
        let err = manager.query("second").await.err().unwrap();
        assert_eq!(err, SessionError::Busy);

        let err = manager.initialize(document(), Language::En).await.unwrap_err();
        assert_eq!(err, SessionError::Busy);
        assert!(manager.is_active());

        // Dropping an unfinished stream releases the slot without committing
        drop(first);
        assert!(!manager.is_busy());
        assert_eq!(manager.history_len(), 2);
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_partial() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        backend.push_reply(Reply::chunks_then_error(
            &["partial ", "answer"],
            BackendError::Upstream("connection reset".to_string()),
        ));

        let mut stream = manager.query("Tell me").await.unwrap();
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }

        assert_eq!(items.len(), 3);
        assert_eq!(stream.text(), "partial answer");
        assert_eq!(
            items[2],
            Err(SessionError::Upstream("connection reset".to_string()))
        );
        assert!(!manager.is_busy());
        // Failed exchanges are not recorded
        assert_eq!(manager.history_len(), 2);
    }

    #[tokio::test]
    async fn test_query_rejected_upstream() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        backend.push_reply(Reply::Fail(BackendError::Unauthenticated(
            "key revoked".to_string(),
        )));

        let err = manager.query("hello").await.err().unwrap();
        assert!(err.requires_authentication());
        assert!(!manager.is_busy());
        assert!(manager.is_active());
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_chunks() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        backend.push_reply(Reply::chunks(&["first", "second", "third"]));

        let mut stream = manager.query("Go").await.unwrap();
        assert_eq!(stream.next().await, Some(Ok("first".to_string())));

        manager.reset();
        assert_eq!(stream.next().await, None);
        assert_eq!(stream.text(), "first");
        assert!(stream.is_finished());
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_reset_idempotent() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = manager(&backend);

        manager.reset();
        manager.reset();
        assert_eq!(manager.state(), SessionState::Uninitialized);

        let manager = active_manager(&backend).await;
        manager.reset();
        manager.reset();
        assert_eq!(manager.state(), SessionState::Uninitialized);
        assert!(manager.axioms().is_none());
        assert!(manager.document().is_none());
        assert!(manager.session_info().is_none());
        assert_eq!(manager.history_len(), 0);
    }

    #[tokio::test]
    async fn test_new_session_starts_clean() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = active_manager(&backend).await;
        let first_id = manager.session_info().unwrap().id;

        backend.push_reply(Reply::chunks(&["answer"]));
        let stream = manager.query("question").await.unwrap();
        let _: Vec<_> = stream.collect().await;
        assert_eq!(manager.history_len(), 4);

        manager.reset();
        backend.push_extraction(Ok(sample_axioms_json()));
        manager
            .initialize(
                Document::from_bytes("other.pdf", b"%PDF-1.7 other"),
                Language::En,
            )
            .await
            .unwrap();

        let info = manager.session_info().unwrap();
        assert_ne!(info.id, first_id);
        assert_eq!(info.document_name, "other.pdf");
        assert_eq!(info.exchanges, 0);
        assert_eq!(manager.history_len(), 2);
    }
}
