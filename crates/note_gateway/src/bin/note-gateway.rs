use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use note_gateway::{
    ai21::Ai21Client,
    api::{self, AppState},
    speech::GoogleSpeechClient,
    tracing::init_tracing_subscriber,
    RecognitionConfig, Summarizer, Transcriber,
};
use response_store::SledResponseStore;

#[derive(Parser)]
#[command(name = "note-gateway", about = "Voice note transcription and summarization gateway")]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5001")]
    listen_addr: SocketAddr,

    /// AI21 Studio API key
    #[arg(long, env = "AI21_API_KEY")]
    ai21_api_key: String,

    /// Path to a file holding the speech API access token
    #[arg(long, env = "SPEECH_ACCESS_TOKEN_PATH")]
    speech_token_path: PathBuf,

    /// Path to the summarization prompt template
    #[arg(
        long,
        env = "SUMMARY_TEMPLATE_PATH",
        default_value = "templates/summarization.txt"
    )]
    template_path: PathBuf,

    /// Directory audio files are read from and uploads are written to
    #[arg(long, env = "AUDIO_DATA_DIR", default_value = "data")]
    audio_dir: PathBuf,

    /// Directory holding the on-disk response caches
    #[arg(long, env = "RESPONSE_CACHE_DIR", default_value = "cache")]
    cache_dir: PathBuf,

    /// Timeout for upstream API calls, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "30")]
    upstream_timeout_secs: u64,

    /// Maximum accepted upload size, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "33554432")]
    max_upload_bytes: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Transcribe and summarize a single audio file, then exit
    Process {
        /// File name under the audio directory
        #[arg(long)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let access_token = std::fs::read_to_string(&cli.speech_token_path)
        .with_context(|| {
            format!(
                "failed to read speech access token from {}",
                cli.speech_token_path.display()
            )
        })?
        .trim()
        .to_string();

    std::fs::create_dir_all(&cli.audio_dir)
        .with_context(|| format!("failed to create audio dir {}", cli.audio_dir.display()))?;

    let summary_store = SledResponseStore::open(cli.cache_dir.join("summaries"))
        .context("failed to open summary store")?;
    let transcription_store = SledResponseStore::open(cli.cache_dir.join("transcriptions"))
        .context("failed to open transcription store")?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.upstream_timeout_secs))
        .build()
        .context("failed to build http client")?;

    let summarizer = Ai21Client::new(cli.ai21_api_key, cli.template_path, summary_store)
        .with_http_client(http.clone());
    let transcriber =
        GoogleSpeechClient::new(access_token, transcription_store).with_http_client(http);

    match cli.command {
        Command::Serve => {
            let state = AppState {
                summarizer,
                transcriber,
                audio_dir: cli.audio_dir,
            };
            let app = api::router(state, cli.max_upload_bytes);

            tracing::info!(addr = %cli.listen_addr, "Starting note gateway...");
            api::serve(cli.listen_addr, app).await?;
        }
        Command::Process { file } => {
            let path = cli.audio_dir.join(&file);

            tracing::info!(path = %path.display(), "Transcribing audio file...");
            let transcript = transcriber
                .transcribe(&path, RecognitionConfig::wav())
                .await
                .context("transcription failed")?;
            println!("transcript:\n{}\n", transcript.text);

            tracing::info!("Summarizing transcript...");
            let summary = summarizer
                .summarize(transcript.text.as_str())
                .await
                .context("summarization failed")?;
            println!("summary:\n{summary}");
        }
    }

    Ok(())
}
