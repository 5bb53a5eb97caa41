//! Configuration for resume-scout

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the assistant
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for all storage
    pub data_dir: PathBuf,

    /// Embedding model name (for reference, actual model set in embedding.rs)
    pub embedding_model: String,

    /// Embedding dimensions (384 for all-MiniLM-L6-v2)
    pub embedding_dimensions: usize,

    /// Base URL of the Ollama completion endpoint
    pub completion_base_url: String,

    /// Completion model name
    pub completion_model: String,

    /// Timeout applied to every external HTTP call
    pub request_timeout: Duration,

    /// Number of nearest records fetched by a fresh search cycle
    pub search_limit: usize,

    /// Per-record character cap when building the extraction prompt
    pub snippet_max_chars: usize,

    /// Number of recent turns included in the answer prompt
    pub recent_turns: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("resume-scout");

        Self {
            data_dir,
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384, // MiniLM-L6-v2 outputs 384-dim vectors
            completion_base_url: "http://localhost:11434".to_string(),
            completion_model: "deepseek-llm:7b".to_string(),
            request_timeout: Duration::from_secs(120),
            search_limit: 5,
            snippet_max_chars: 300,
            recent_turns: 10,
        }
    }
}

impl Config {
    /// Create a new config with a custom data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Get the path to the vector database
    pub fn vector_db_path(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    /// Get the path to the persisted conversation log
    pub fn chat_log_path(&self) -> PathBuf {
        self.data_dir.join("chat_history.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.vector_db_path())?;
        Ok(())
    }
}
