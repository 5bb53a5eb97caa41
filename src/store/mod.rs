//! Vector store abstraction and backends

pub mod lance;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use lance::LanceStore;

/// Review status attached to a resume at ingestion time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Shortlisted,
    Rejected,
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateStatus::Shortlisted => write!(f, "shortlisted"),
            CandidateStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl CandidateStatus {
    /// Parse a stored status string, `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shortlisted" => Some(Self::Shortlisted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A stored resume record. Owned by the vector store; the conversation
/// core only ever reads these.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    /// Store key for this record
    pub id: String,

    /// Full resume summary text
    pub text: String,

    /// Review status, if one was recorded at ingestion
    pub status: Option<CandidateStatus>,
}

/// A record plus its embedding, ready for upsert
#[derive(Debug, Clone)]
pub struct CandidatePoint {
    pub record: CandidateRecord,
    pub vector: Vec<f32>,
}

/// Result from a nearest-neighbor search, best score first
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: CandidateRecord,
    pub score: f32,
}

/// Record storage with nearest-neighbor search and retrieval by id
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The `limit` nearest records to `vector`, best score first
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Retrieve records by id; ids with no record are silently absent
    async fn retrieve(&self, ids: &[String]) -> Result<Vec<CandidateRecord>>;

    /// Insert or replace records
    async fn upsert(&self, points: Vec<CandidatePoint>) -> Result<()>;
}
