//! Resume record storage using LanceDB

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::connect;
use lancedb::query::{ExecutableQuery, QueryBase};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{CandidatePoint, CandidateRecord, CandidateStatus, SearchHit, VectorStore};

const TABLE_NAME: &str = "resumes";

/// Vector storage backend using LanceDB
pub struct LanceStore {
    db: lancedb::Connection,
    dimensions: usize,
}

impl LanceStore {
    /// Open (or create) the resume table
    pub async fn new(config: &Config) -> Result<Self> {
        let path = config.vector_db_path();
        let db = connect(path.to_str().ok_or_else(|| {
            Error::config(format!("Non-UTF-8 vector db path: {}", path.display()))
        })?)
        .execute()
        .await
        .map_err(|e| Error::vector_db(e.to_string()))?;

        let store = Self {
            db,
            dimensions: config.embedding_dimensions,
        };

        store.ensure_table().await?;

        Ok(store)
    }

    /// Schema for the resume table
    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, true),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimensions as i32,
                ),
                false,
            ),
        ])
    }

    /// Create the resume table if it does not exist yet
    async fn ensure_table(&self) -> Result<()> {
        let tables = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        if !tables.contains(&TABLE_NAME.to_string()) {
            let schema = Arc::new(self.schema());
            let empty_batch = RecordBatch::new_empty(schema.clone());
            let reader = RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema);

            self.db
                .create_table(TABLE_NAME, Box::new(reader))
                .execute()
                .await
                .map_err(|e| Error::vector_db(e.to_string()))?;
        }

        Ok(())
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))
    }

    /// Decode a result batch into records, with the `_distance` column when present
    fn decode_batch(batch: &RecordBatch) -> Result<Vec<(CandidateRecord, Option<f32>)>> {
        let ids = Self::string_column(batch, "id")?;
        let texts = Self::string_column(batch, "text")?;
        let statuses = Self::string_column(batch, "status")?;

        let distances = match batch.column_by_name("_distance") {
            Some(col) => Some(
                col.as_any()
                    .downcast_ref::<Float32Array>()
                    .ok_or_else(|| Error::vector_db("_distance column is not Float32Array"))?,
            ),
            None => None,
        };

        let mut rows = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let status = if statuses.is_null(i) {
                None
            } else {
                let raw = statuses.value(i);
                let parsed = CandidateStatus::parse(raw);
                if parsed.is_none() {
                    tracing::warn!(status = raw, "Ignoring unrecognized status on record");
                }
                parsed
            };

            rows.push((
                CandidateRecord {
                    id: ids.value(i).to_string(),
                    text: texts.value(i).to_string(),
                    status,
                },
                distances.map(|d| d.value(i)),
            ));
        }

        Ok(rows)
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .ok_or_else(|| Error::vector_db(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::vector_db(format!("{} column is not StringArray", name)))
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let table = self.open_table().await?;

        let stream = table
            .vector_search(vector.to_vec())
            .map_err(|e| Error::vector_db(e.to_string()))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let mut hits = Vec::new();
        for batch in &batches {
            for (record, distance) in Self::decode_batch(batch)? {
                let distance =
                    distance.ok_or_else(|| Error::vector_db("Missing _distance column"))?;
                // LanceDB returns L2 distance, convert to similarity score
                let score = 1.0 / (1.0 + distance);
                hits.push(SearchHit { record, score });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    async fn retrieve(&self, ids: &[String]) -> Result<Vec<CandidateRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.open_table().await?;

        let quoted: Vec<String> = ids
            .iter()
            .map(|id| format!("'{}'", id.replace('\'', "''")))
            .collect();
        let filter = format!("id IN ({})", quoted.join(", "));

        let stream = table
            .query()
            .only_if(filter)
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let mut records = Vec::new();
        for batch in &batches {
            for (record, _) in Self::decode_batch(batch)? {
                records.push(record);
            }
        }

        Ok(records)
    }

    async fn upsert(&self, points: Vec<CandidatePoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        for point in &points {
            if point.vector.len() != self.dimensions {
                return Err(Error::vector_db(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dimensions,
                    point.vector.len()
                )));
            }
        }

        let table = self.open_table().await?;

        // Replace any records that share an id with the incoming batch
        let quoted: Vec<String> = points
            .iter()
            .map(|p| format!("'{}'", p.record.id.replace('\'', "''")))
            .collect();
        let _ = table.delete(&format!("id IN ({})", quoted.join(", "))).await;

        let id_array = StringArray::from(
            points
                .iter()
                .map(|p| p.record.id.clone())
                .collect::<Vec<_>>(),
        );
        let text_array = StringArray::from(
            points
                .iter()
                .map(|p| p.record.text.clone())
                .collect::<Vec<_>>(),
        );
        let status_array = StringArray::from(
            points
                .iter()
                .map(|p| p.record.status.map(|s| s.to_string()))
                .collect::<Vec<Option<String>>>(),
        );

        let values = Float32Array::from(
            points
                .iter()
                .flat_map(|p| p.vector.iter().copied())
                .collect::<Vec<f32>>(),
        );
        let vector_array = FixedSizeListArray::try_new_from_values(values, self.dimensions as i32)
            .map_err(|e: arrow_schema::ArrowError| Error::vector_db(e.to_string()))?;

        let schema = Arc::new(self.schema());
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(id_array) as Arc<dyn Array>,
                Arc::new(text_array),
                Arc::new(status_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| Error::vector_db(e.to_string()))?;

        let reader = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);

        table
            .add(Box::new(reader))
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        Ok(())
    }
}
