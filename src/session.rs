//! Per-session orchestration of resolution, composition, and memory

use std::sync::Arc;

use crate::completion::CompletionModel;
use crate::compose::AnswerComposer;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::memory::ConversationMemory;
use crate::resolver::{ConversationState, EntityResolver};
use crate::store::VectorStore;
use crate::turn::Turn;

/// One conversation session. Owns its state and memory exclusively; turns
/// are processed strictly one at a time.
pub struct ChatSession {
    resolver: EntityResolver,
    composer: AnswerComposer,
    memory: ConversationMemory,
    state: ConversationState,
}

impl ChatSession {
    /// Create a session over the given collaborators and a (possibly
    /// pre-loaded) conversation log
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn CompletionModel>,
        config: &Config,
        memory: ConversationMemory,
    ) -> Self {
        Self {
            resolver: EntityResolver::new(embedder, store.clone(), llm.clone(), config),
            composer: AnswerComposer::new(store, llm, config),
            memory,
            state: ConversationState::new(),
        }
    }

    /// Process one user turn: resolve the grounding candidate, compose the
    /// answer, and update the log.
    ///
    /// The user's utterance is appended (and persisted) even when the turn
    /// fails, so context survives a retry. The assistant turn is appended
    /// only on success.
    pub async fn handle_turn(&mut self, utterance: &str) -> Result<String> {
        self.memory.append(Turn::user(utterance));

        let result = self.run_turn(utterance).await;

        if let Ok(answer) = &result {
            self.memory.append(Turn::assistant(answer.clone()));
        }

        // A persistence failure is reported but never aborts the in-memory
        // session.
        if let Err(e) = self.memory.persist() {
            tracing::warn!(error = %e, path = %self.memory.path().display(),
                "Failed to persist conversation log");
        }

        result
    }

    async fn run_turn(&mut self, utterance: &str) -> Result<String> {
        let focus = self.resolver.resolve(utterance, &mut self.state).await?;
        self.composer.compose(&self.memory, &self.state, &focus).await
    }

    /// Current resolution state
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The conversation log
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Persist the log, e.g. before exiting
    pub fn persist(&self) -> Result<()> {
        self.memory.persist()
    }
}

/// User-facing message for a failed turn
pub fn describe_turn_error(err: &Error) -> String {
    match err {
        Error::NoCandidates => {
            "I couldn't find any candidates in the store. Ingest some resumes first.".to_string()
        }
        Error::NoFocus => {
            "I can't tell which candidate you mean yet. Try describing the role you're hiring for."
                .to_string()
        }
        e if e.is_transient() => {
            "I couldn't complete that turn. Please try again in a moment.".to_string()
        }
        _ => "Something went wrong answering that. Please try again.".to_string(),
    }
}
