//! Shared test doubles for the service traits

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::CompletionModel;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::store::{CandidatePoint, CandidateRecord, SearchHit, VectorStore};

/// Build a search hit with a fixed score
pub fn hit(id: &str, text: &str) -> SearchHit {
    SearchHit {
        record: record(id, text),
        score: 0.9,
    }
}

/// Build a bare record with no status
pub fn record(id: &str, text: &str) -> CandidateRecord {
    CandidateRecord {
        id: id.to_string(),
        text: text.to_string(),
        status: None,
    }
}

/// Embedder that returns a fixed small vector and counts calls
#[derive(Default)]
pub struct StubEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.1, 0.2, 0.3, 0.4])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3, 0.4]).collect())
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Store whose search results are scripted per call, with a record map
/// backing `retrieve` and `upsert`
#[derive(Default)]
pub struct ScriptedStore {
    pub search_calls: AtomicUsize,
    search_results: Mutex<VecDeque<Vec<SearchHit>>>,
    records: Mutex<HashMap<String, CandidateRecord>>,
}

impl ScriptedStore {
    /// Queue the result of the next search call
    pub fn push_search(&self, hits: Vec<SearchHit>) {
        for hit in &hits {
            self.insert_record(hit.record.clone());
        }
        self.search_results.lock().unwrap().push_back(hits);
    }

    /// Make a record retrievable by id
    pub fn insert_record(&self, record: CandidateRecord) {
        self.records.lock().unwrap().insert(record.id.clone(), record);
    }

    /// Number of records currently held
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn search(&self, _vector: &[f32], _limit: usize) -> Result<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn retrieve(&self, ids: &[String]) -> Result<Vec<CandidateRecord>> {
        let records = self.records.lock().unwrap();
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn upsert(&self, points: Vec<CandidatePoint>) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        for point in points {
            records.insert(point.record.id.clone(), point.record);
        }
        Ok(())
    }
}

/// Completion model that replays scripted responses and records prompts
pub struct ScriptedCompletion {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    /// Replay `responses` in order; further calls fail as transient errors
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        }
    }

    /// A completion model whose every call fails
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CompletionModel for ScriptedCompletion {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::completion("scripted completion exhausted"))
    }
}
