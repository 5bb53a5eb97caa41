//! Grounded answer composition

use std::sync::Arc;

use crate::completion::CompletionModel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::memory::ConversationMemory;
use crate::resolver::ConversationState;
use crate::store::{CandidateRecord, VectorStore};
use crate::turn::Turn;

const PREAMBLE: &str = "The following is a conversation between a recruiter and a helpful \
                        assistant that answers questions about candidate resumes. The assistant \
                        grounds every answer in the candidate profile provided below.";

/// Builds the grounding prompt for a resolved candidate and obtains the reply
pub struct AnswerComposer {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn CompletionModel>,
    recent_turns: usize,
}

impl AnswerComposer {
    /// Create a composer over the given collaborators
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn CompletionModel>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            llm,
            recent_turns: config.recent_turns,
        }
    }

    /// Generate a whitespace-trimmed answer grounded on the focus candidate.
    ///
    /// Does not append the answer to memory; the session does that uniformly
    /// for both roles.
    pub async fn compose(
        &self,
        memory: &ConversationMemory,
        state: &ConversationState,
        focus: &str,
    ) -> Result<String> {
        let id = state.record_id(focus).ok_or(Error::NoFocus)?;

        let records = self.store.retrieve(&[id.to_string()]).await?;
        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("No stored record for candidate {}", focus)))?;

        let prompt = build_answer_prompt(memory.recent(self.recent_turns), focus, &record);
        let answer = self.llm.generate(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

/// Render the grounding prompt: preamble, recent turns oldest first, the
/// focus candidate's full record, and the assistant cue.
fn build_answer_prompt(recent: &[Turn], focus: &str, record: &CandidateRecord) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");

    for turn in recent {
        prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
    }

    prompt.push_str(&format!("\nCandidate profile ({}):\n", focus));
    if let Some(status) = record.status {
        prompt.push_str(&format!("Status: {}\n", status));
    }
    prompt.push_str(&record.text);
    prompt.push_str("\n\nAssistant:");
    prompt
}
