//! # Resume Scout
//!
//! A conversational retrieval assistant over a pool of candidate resumes.
//! Users ask natural-language questions; the assistant finds relevant
//! resumes via semantic search, tracks which candidate follow-up questions
//! refer to, and answers grounded in the retrieved resume text.
//!
//! ## Architecture
//!
//! - **EntityResolver** - per-turn state machine deciding whether a fresh
//!   semantic search is needed or the conversation continues on a known
//!   candidate
//! - **AnswerComposer** - grounds the reply in the focus candidate's record
//! - **ConversationMemory** - persisted ordered turn log
//! - Collaborators behind traits: `Embedder` (fastembed), `VectorStore`
//!   (LanceDB), `CompletionModel` (Ollama)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resume_scout::{ChatSession, Config, ConversationMemory};
//!
//! let config = Config::default();
//! let mut session = ChatSession::new(embedder, store, llm, &config, memory);
//!
//! let answer = session.handle_turn("Find me a Python backend engineer").await?;
//! ```

pub mod completion;
pub mod compose;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod memory;
pub mod resolver;
pub mod session;
pub mod store;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use completion::{CompletionModel, OllamaClient};
pub use compose::AnswerComposer;
pub use config::Config;
pub use embedding::{Embedder, FastEmbedder};
pub use error::{Error, Result};
pub use memory::ConversationMemory;
pub use resolver::{ConversationState, EntityResolver, UNKNOWN_CANDIDATE};
pub use session::{describe_turn_error, ChatSession};
pub use store::{CandidateRecord, CandidateStatus, LanceStore, SearchHit, VectorStore};
pub use turn::{Role, Turn};
