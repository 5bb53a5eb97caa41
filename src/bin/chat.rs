//! Resume Scout chat REPL
//!
//! Interactive command loop: one user turn per line, `quit`/`exit` ends the
//! session after persisting the conversation log. `--ingest <file>` loads a
//! parsed-resumes JSON file into the store before chatting.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resume_scout::{
    describe_turn_error, ChatSession, Config, ConversationMemory, FastEmbedder, LanceStore,
    OllamaClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ingest_path = parse_args()?;

    let config = Config::default();
    config.ensure_dirs()?;
    tracing::info!("Data directory: {:?}", config.data_dir);

    let embedder = Arc::new(FastEmbedder::new(&config)?);
    let store = Arc::new(LanceStore::new(&config).await?);
    let llm = Arc::new(OllamaClient::new(&config)?);

    if let Some(path) = ingest_path {
        tracing::info!("Reading labeled resume summaries from {:?}", path);
        let summaries = resume_scout::ingest::load_labeled_summaries(&path)?;
        let count =
            resume_scout::ingest::ingest_summaries(store.as_ref(), embedder.as_ref(), &summaries)
                .await?;
        println!("Loaded {} resumes into the store.", count);
    }

    let memory = ConversationMemory::load(config.chat_log_path())?;
    if !memory.is_empty() {
        println!("Resuming conversation ({} earlier turns).", memory.len());
    }

    let mut session = ChatSession::new(embedder, store, llm, &config, memory);

    println!("Ready to chat about candidates. Type 'quit' to exit.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if utterance.eq_ignore_ascii_case("quit") || utterance.eq_ignore_ascii_case("exit") {
            break;
        }

        match session.handle_turn(utterance).await {
            Ok(answer) => println!("\nAssistant: {}\n", answer),
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                println!("\n{}\n", describe_turn_error(&e));
            }
        }
    }

    if let Err(e) = session.persist() {
        tracing::warn!(error = %e, "Failed to persist conversation log on exit");
    } else {
        println!("Goodbye. Your conversation is saved.");
    }

    Ok(())
}

fn parse_args() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut ingest = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ingest" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--ingest requires a file path"))?;
                ingest = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(ingest)
}
