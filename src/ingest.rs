//! Bulk ingestion of labeled resume summaries
//!
//! Summaries arrive pre-parsed as a JSON array of `{Summary, Folder}`
//! entries; the folder name carries the review decision. Raw PDF/DOCX
//! parsing happens upstream and is out of scope here.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::{CandidatePoint, CandidateRecord, CandidateStatus, VectorStore};

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(rename = "Summary", default)]
    summary: String,

    #[serde(rename = "Folder", default)]
    folder: String,
}

/// A resume summary with its review status
#[derive(Debug, Clone)]
pub struct LabeledSummary {
    pub text: String,
    pub status: CandidateStatus,
}

/// Load labeled summaries from a parsed-resumes JSON file.
///
/// Entries whose folder names neither a shortlist nor a reject decision,
/// or whose summary is empty, are skipped with a warning.
pub fn load_labeled_summaries(path: &Path) -> Result<Vec<LabeledSummary>> {
    let file = File::open(path)?;
    let raw: Vec<RawSummary> = serde_json::from_reader(BufReader::new(file))?;

    let mut summaries = Vec::with_capacity(raw.len());
    for entry in raw {
        let text = entry.summary.trim();
        if text.is_empty() {
            tracing::warn!("Skipping entry with empty summary");
            continue;
        }

        let folder = entry.folder.to_lowercase();
        let status = if folder.contains("shortlist") {
            CandidateStatus::Shortlisted
        } else if folder.contains("reject") {
            CandidateStatus::Rejected
        } else {
            tracing::warn!(folder = %entry.folder, "Skipping entry with unknown status");
            continue;
        };

        summaries.push(LabeledSummary {
            text: text.to_string(),
            status,
        });
    }

    Ok(summaries)
}

/// Embed all summaries in one batch and upsert them as fresh records.
/// Returns the number of records written.
pub async fn ingest_summaries(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    summaries: &[LabeledSummary],
) -> Result<usize> {
    if summaries.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = summaries.iter().map(|s| s.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    let points: Vec<CandidatePoint> = summaries
        .iter()
        .zip(vectors)
        .map(|(summary, vector)| CandidatePoint {
            record: CandidateRecord {
                id: Uuid::new_v4().to_string(),
                text: summary.text.clone(),
                status: Some(summary.status),
            },
            vector,
        })
        .collect();

    let count = points.len();
    store.upsert(points).await?;
    tracing::info!(count, "Uploaded resume records");

    Ok(count)
}
