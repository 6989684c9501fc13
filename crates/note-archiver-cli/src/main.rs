use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use note_archiver_client::ReqwestArchiveClient;
use note_archiver_core::{
    ArchiveDispatcher, ArchiverConfig, LOG_TARGET, ModNote, NoteArchiveJob, TracingReporter,
    extract_urls,
};

#[derive(Parser)]
#[command(
    name = "note-archiver",
    version,
    about = "Archive links found in moderator notes to the Wayback Machine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the links found in a note as JSON, without archiving them
    Extract {
        #[command(flatten)]
        source: TextSource,
    },

    /// Archive every link found in a single note
    Archive {
        #[command(flatten)]
        archiver: ArchiverArgs,

        /// Identifier of the note, used in log lines
        #[arg(long, default_value = "cli")]
        record_id: String,

        #[command(flatten)]
        source: TextSource,
    },

    /// Archive a stream of notes given as newline-delimited JSON ({"id", "note"})
    Run {
        #[command(flatten)]
        archiver: ArchiverArgs,

        /// NDJSON file to read notes from (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Where the note text comes from. Reads stdin when neither flag is given.
#[derive(Args)]
struct TextSource {
    /// Note text
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// File containing the note text
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct ArchiverArgs {
    /// Domain of the submitting application (sent in the User-Agent header)
    #[arg(long, env = "NOTE_ARCHIVER_APP_DOMAIN")]
    app_domain: String,

    /// Save endpoint that links are appended to
    #[arg(
        long,
        env = "NOTE_ARCHIVER_SAVE_ENDPOINT",
        default_value = note_archiver_core::config::DEFAULT_SAVE_ENDPOINT
    )]
    save_endpoint: String,

    /// Seconds to wait between two submissions
    #[arg(long, env = "NOTE_ARCHIVER_PACING_SECS", default_value_t = 5)]
    pacing_secs: u64,

    /// Per-request connect/read timeout in seconds
    #[arg(long, env = "NOTE_ARCHIVER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Total HTTP attempts per link
    #[arg(long, env = "NOTE_ARCHIVER_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,
}

impl ArchiverArgs {
    fn into_config(self) -> ArchiverConfig {
        ArchiverConfig::new(self.app_domain)
            .with_save_endpoint(self.save_endpoint)
            .with_pacing_interval(Duration::from_secs(self.pacing_secs))
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_attempts(self.max_attempts)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("note_archiver=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { source } => {
            let text = source.read().await?;
            let urls = extract_urls(&text);
            println!("{}", serde_json::to_string_pretty(&urls)?);
        }
        Commands::Archive {
            archiver,
            record_id,
            source,
        } => {
            let text = source.read().await?;
            let job = build_job(archiver.into_config())?;
            let note = ModNote::new(record_id, text);

            let summary = job
                .perform(&note, &TracingReporter)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Run { archiver, input } => {
            let job = build_job(archiver.into_config())?;
            cmd_run(&job, input.as_deref()).await?;
        }
    }

    Ok(())
}

impl TextSource {
    async fn read(self) -> Result<String> {
        if let Some(text) = self.text {
            return Ok(text);
        }
        if let Some(path) = self.file {
            return tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read note file: {}", path.display()));
        }

        let mut text = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut text)
            .await
            .context("Failed to read note text from stdin")?;
        Ok(text)
    }
}

fn build_job(config: ArchiverConfig) -> Result<NoteArchiveJob<ReqwestArchiveClient>> {
    let client = ReqwestArchiveClient::new(&config).context("Failed to create HTTP client")?;
    Ok(NoteArchiveJob::new(ArchiveDispatcher::new(client, config)))
}

/// Process notes one at a time until the input ends or Ctrl-C is received.
///
/// Cancellation is only observed between notes; a note whose links are being
/// archived always runs to completion.
async fn cmd_run(job: &NoteArchiveJob<ReqwestArchiveClient>, input: Option<&Path>) -> Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input: {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: LOG_TARGET, "Shutdown signal received, stopping after the current note");
            shutdown_token.cancel();
        }
    });

    let mut line_no = 0usize;
    let mut processed = 0usize;
    let mut failed = 0usize;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read note record")?,
            () = cancel_token.cancelled() => break,
        };
        let Some(line) = line else { break };
        line_no += 1;

        if line.trim().is_empty() {
            continue;
        }

        let note = match ModNote::from_json_line(&line) {
            Ok(note) => note,
            Err(e) => {
                tracing::error!(target: LOG_TARGET, line = line_no, error = %e, "Skipping malformed note record");
                failed += 1;
                continue;
            }
        };

        match job.perform(&note, &TracingReporter).await {
            Ok(_) => processed += 1,
            Err(e) => {
                tracing::error!(target: LOG_TARGET, record_id = %note.id, error = %e, "Note archive job failed");
                failed += 1;
            }
        }
    }

    tracing::info!(target: LOG_TARGET, processed, failed, "Run finished");

    if failed > 0 {
        anyhow::bail!("{failed} note(s) could not be processed");
    }
    Ok(())
}
