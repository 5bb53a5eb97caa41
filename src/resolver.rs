//! Turn-by-turn entity resolution
//!
//! Decides, for each user utterance, which candidate the answer should be
//! grounded on. A fresh search-and-extract cycle runs only when nothing is
//! known yet or the user explicitly pivots to a different candidate;
//! otherwise the conversation keeps its thread through a cheap literal
//! name scan, so "what about their education?" stays on the same person.

use std::collections::HashMap;
use std::sync::Arc;

use crate::completion::CompletionModel;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::extract::extract_names;
use crate::store::{SearchHit, VectorStore};

/// Sentinel name used when extraction yields nothing but a search hit exists
pub const UNKNOWN_CANDIDATE: &str = "Unknown";

/// Phrases that signal the user wants a different candidate. Substring,
/// case-insensitive; false positives are tolerated and just cost a search.
const PIVOT_KEYWORDS: &[&str] = &["someone else", "another", "anyone else"];

/// Working memory of who the conversation is about
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Known candidate names mapped to their store record ids
    entities: HashMap<String, String>,

    /// Name the next answer should be grounded on.
    /// Invariant: when set, it is a key of `entities`.
    focus: Option<String>,
}

impl ConversationState {
    /// Create an empty state for a new session
    pub fn new() -> Self {
        Self::default()
    }

    /// Known name-to-record-id mapping
    pub fn entities(&self) -> &HashMap<String, String> {
        &self.entities
    }

    /// Name currently in focus, if any
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Record id for a known name
    pub fn record_id(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    /// State with a single resolved entity in focus
    #[cfg(test)]
    pub(crate) fn with_entity(name: &str, id: &str) -> Self {
        let mut state = Self::new();
        state.entities.insert(name.to_string(), id.to_string());
        state.focus = Some(name.to_string());
        state
    }
}

/// The per-turn resolution state machine
pub struct EntityResolver {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn CompletionModel>,
    search_limit: usize,
    snippet_max_chars: usize,
}

impl EntityResolver {
    /// Create a resolver over the given collaborators
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn CompletionModel>,
        config: &Config,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            search_limit: config.search_limit,
            snippet_max_chars: config.snippet_max_chars,
        }
    }

    /// Resolve the grounding candidate for this turn, updating `state`.
    ///
    /// On error, `state` is left exactly as it was; a failed turn never
    /// commits a partial entity set or focus.
    pub async fn resolve(&self, utterance: &str, state: &mut ConversationState) -> Result<String> {
        if state.entities.is_empty() || contains_pivot_keyword(utterance) {
            return self.fresh_cycle(utterance, state).await;
        }

        // Continuation: a literal word-boundary mention switches focus; no
        // mention means we are still talking about the same candidate. A
        // mentioned name we do not know is deliberately ignored here.
        let lower = utterance.to_lowercase();
        let mentioned = state
            .entities
            .keys()
            .filter_map(|name| find_word(&lower, &name.to_lowercase()).map(|pos| (pos, name)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, name)| name.clone());

        if let Some(name) = mentioned {
            tracing::debug!(name = %name, "Focus switched by explicit mention");
            state.focus = Some(name);
        }

        state.focus.clone().ok_or(Error::NoFocus)
    }

    /// Embed, search, extract, and rebuild the entity set from scratch
    async fn fresh_cycle(&self, utterance: &str, state: &mut ConversationState) -> Result<String> {
        let query_vector = self.embedder.embed(utterance).await?;
        let hits = self.store.search(&query_vector, self.search_limit).await?;
        if hits.is_empty() {
            return Err(Error::NoCandidates);
        }

        let prompt = self.build_extraction_prompt(utterance, &hits);
        let response = self.llm.generate(&prompt).await?;
        let names = extract_names(&response);
        tracing::debug!(count = names.len(), "Extracted candidate names");

        // Stage the new entity set locally; commit only once every external
        // call has succeeded.
        let mut entities = HashMap::new();
        let mut focus = None;

        // Names resolve sequentially so the last one extracted wins focus.
        for name in names {
            let name_vector = self.embedder.embed(&name).await?;
            let name_hits = self.store.search(&name_vector, 1).await?;
            match name_hits.into_iter().next() {
                Some(hit) => {
                    entities.insert(name.clone(), hit.record.id);
                    focus = Some(name);
                }
                None => {
                    tracing::debug!(name = %name, "No record found for extracted name, skipping")
                }
            }
        }

        // Nothing usable extracted: fall back to the best-scoring hit of the
        // original search under a sentinel label.
        let focus = match focus {
            Some(name) => name,
            None => {
                let top = &hits[0];
                entities.insert(UNKNOWN_CANDIDATE.to_string(), top.record.id.clone());
                UNKNOWN_CANDIDATE.to_string()
            }
        };

        state.entities = entities;
        state.focus = Some(focus.clone());
        Ok(focus)
    }

    fn build_extraction_prompt(&self, utterance: &str, hits: &[SearchHit]) -> String {
        let mut prompt = String::from(
            "You are helping a recruiter identify which candidates a request refers to.\n\n\
             Resume snippets:\n",
        );
        for (i, hit) in hits.iter().enumerate() {
            let snippet: String = hit.record.text.chars().take(self.snippet_max_chars).collect();
            prompt.push_str(&format!("{}. {}\n", i + 1, snippet));
        }
        prompt.push_str(&format!("\nUser request: {}\n\n", utterance));
        prompt.push_str(
            "Return ONLY a JSON object of the form {\"selected_names\": [\"...\"]} listing the \
             full names of the candidates above that match the request. If none match, return \
             {\"selected_names\": []}. Do not ask clarifying questions. Do not add any other \
             text.",
        );
        prompt
    }
}

/// Case-insensitive substring test against the pivot phrase set
fn contains_pivot_keyword(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    PIVOT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Byte position of the first word-boundary occurrence of `needle` in
/// `haystack`, both already lowercased. A boundary is any non-alphanumeric
/// character or the string edge.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let begin = from + offset;
        let end = begin + needle.len();

        let boundary_before = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let boundary_after = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());

        if boundary_before && boundary_after {
            return Some(begin);
        }
        from = end;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hit, ScriptedCompletion, ScriptedStore, StubEmbedder};
    use std::sync::atomic::Ordering;

    fn resolver(
        embedder: Arc<StubEmbedder>,
        store: Arc<ScriptedStore>,
        llm: Arc<ScriptedCompletion>,
    ) -> EntityResolver {
        let config = Config::with_data_dir("unused");
        EntityResolver::new(embedder, store, llm, &config)
    }

    fn state_with(entries: &[(&str, &str)], focus: Option<&str>) -> ConversationState {
        let mut state = ConversationState::new();
        for (name, id) in entries {
            state.entities.insert(name.to_string(), id.to_string());
        }
        state.focus = focus.map(String::from);
        state
    }

    #[test]
    fn pivot_keywords_are_case_insensitive_substrings() {
        assert!(contains_pivot_keyword("show me SOMEONE ELSE"));
        assert!(contains_pivot_keyword("another Go developer please"));
        assert!(contains_pivot_keyword("is there anyone else?"));
        assert!(!contains_pivot_keyword("what about her education?"));
    }

    #[test]
    fn find_word_requires_boundaries() {
        assert_eq!(find_word("tell me about jane doe's skills", "jane doe"), Some(14));
        assert_eq!(find_word("janet doe is different", "jane"), None);
        assert_eq!(find_word("jane", "jane"), Some(0));
        assert_eq!(find_word("", "jane"), None);
    }

    #[tokio::test]
    async fn empty_state_triggers_fresh_cycle() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![hit("id-1", "Jane Doe. Python backend engineer.")]);
        store.push_search(vec![hit("id-1", "Jane Doe. Python backend engineer.")]);
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"{"selected_names": ["Jane Doe"]}"#.to_string(),
        ]));

        let resolver = resolver(embedder.clone(), store.clone(), llm);
        let mut state = ConversationState::new();
        let focus = resolver
            .resolve("Find me a Python backend engineer", &mut state)
            .await
            .unwrap();

        assert_eq!(focus, "Jane Doe");
        assert_eq!(state.record_id("Jane Doe"), Some("id-1"));
        assert_eq!(state.focus(), Some("Jane Doe"));
        // One embed for the utterance, one per extracted name
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pivot_keyword_triggers_fresh_cycle_despite_known_entities() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![hit("id-2", "Bob Smith. Go services engineer.")]);
        store.push_search(vec![hit("id-2", "Bob Smith. Go services engineer.")]);
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"{"selected_names": ["Bob Smith"]}"#.to_string(),
        ]));

        let resolver = resolver(embedder, store.clone(), llm);
        let mut state = state_with(&[("Jane Doe", "id-1")], Some("Jane Doe"));
        let focus = resolver
            .resolve("Tell me about someone else with Go experience", &mut state)
            .await
            .unwrap();

        assert_eq!(focus, "Bob Smith");
        // Fresh cycle rebuilds the entity set from scratch
        assert_eq!(state.entities().len(), 1);
        assert_eq!(state.record_id("Jane Doe"), None);
        assert!(store.search_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn explicit_mention_switches_focus_without_service_calls() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        let llm = Arc::new(ScriptedCompletion::new(vec![]));

        let resolver = resolver(embedder.clone(), store.clone(), llm.clone());
        let mut state = state_with(
            &[("Jane Doe", "id-1"), ("Bob Smith", "id-2")],
            Some("Jane Doe"),
        );
        let focus = resolver
            .resolve("What does Bob Smith know about Kubernetes?", &mut state)
            .await
            .unwrap();

        assert_eq!(focus, "Bob Smith");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn silence_on_naming_keeps_previous_focus() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        let llm = Arc::new(ScriptedCompletion::new(vec![]));

        let resolver = resolver(embedder.clone(), store.clone(), llm);
        let mut state = state_with(&[("Jane Doe", "id-1")], Some("Jane Doe"));
        let focus = resolver.resolve("What's her education?", &mut state).await.unwrap();

        assert_eq!(focus, "Jane Doe");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_name_mention_keeps_previous_focus() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        let llm = Arc::new(ScriptedCompletion::new(vec![]));

        let resolver = resolver(embedder, store, llm);
        let mut state = state_with(&[("Jane Doe", "id-1")], Some("Jane Doe"));
        let focus = resolver
            .resolve("How does Carol compare?", &mut state)
            .await
            .unwrap();

        assert_eq!(focus, "Jane Doe");
    }

    #[tokio::test]
    async fn last_extracted_name_wins_focus() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![
            hit("id-1", "Alice. Data engineer."),
            hit("id-2", "Bob. Data engineer."),
        ]);
        store.push_search(vec![hit("id-1", "Alice. Data engineer.")]);
        store.push_search(vec![hit("id-2", "Bob. Data engineer.")]);
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"{"selected_names": ["Alice", "Bob"]}"#.to_string(),
        ]));

        let resolver = resolver(embedder, store, llm);
        let mut state = ConversationState::new();
        let focus = resolver.resolve("Find me data engineers", &mut state).await.unwrap();

        assert_eq!(focus, "Bob");
        assert_eq!(state.entities().len(), 2);
        assert_eq!(state.record_id("Alice"), Some("id-1"));
        assert_eq!(state.record_id("Bob"), Some("id-2"));
    }

    #[tokio::test]
    async fn empty_extraction_falls_back_to_sentinel_on_top_hit() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![
            hit("id-9", "Best match resume text."),
            hit("id-3", "Second match."),
        ]);
        let llm = Arc::new(ScriptedCompletion::new(vec![
            "I'm not sure which candidates you mean.".to_string(),
        ]));

        let resolver = resolver(embedder, store, llm);
        let mut state = state_with(&[("Jane Doe", "id-1")], Some("Jane Doe"));
        let focus = resolver
            .resolve("Find me another strong candidate", &mut state)
            .await
            .unwrap();

        assert_eq!(focus, UNKNOWN_CANDIDATE);
        assert_eq!(state.entities().len(), 1);
        assert_eq!(state.record_id(UNKNOWN_CANDIDATE), Some("id-9"));
    }

    #[tokio::test]
    async fn names_without_records_fall_back_to_sentinel() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![hit("id-9", "Best match resume text.")]);
        // The name search finds nothing
        store.push_search(Vec::new());
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"{"selected_names": ["Ghost Candidate"]}"#.to_string(),
        ]));

        let resolver = resolver(embedder, store, llm);
        let mut state = ConversationState::new();
        let focus = resolver.resolve("Find me an engineer", &mut state).await.unwrap();

        assert_eq!(focus, UNKNOWN_CANDIDATE);
        assert_eq!(state.record_id(UNKNOWN_CANDIDATE), Some("id-9"));
    }

    #[tokio::test]
    async fn empty_store_surfaces_no_candidates() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(Vec::new());
        let llm = Arc::new(ScriptedCompletion::new(vec![]));

        let resolver = resolver(embedder, store, llm);
        let mut state = ConversationState::new();
        let err = resolver.resolve("Find me anyone", &mut state).await.unwrap_err();

        assert!(matches!(err, Error::NoCandidates));
        assert!(state.entities().is_empty());
        assert_eq!(state.focus(), None);
    }

    #[tokio::test]
    async fn failed_fresh_cycle_leaves_state_untouched() {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(ScriptedStore::default());
        store.push_search(vec![hit("id-9", "Resume text.")]);
        // No scripted completion response: the generate call fails
        let llm = Arc::new(ScriptedCompletion::failing());

        let resolver = resolver(embedder, store, llm);
        let mut state = state_with(&[("Jane Doe", "id-1")], Some("Jane Doe"));
        let err = resolver
            .resolve("Show me another candidate", &mut state)
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(state.record_id("Jane Doe"), Some("id-1"));
        assert_eq!(state.focus(), Some("Jane Doe"));
    }
}
