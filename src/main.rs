use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use yt_transcript_fetcher::export::{self, ExportOptions};
use yt_transcript_fetcher::{page, Config, Coordinator, HttpTabHost, InnertubeClient};

#[derive(Parser, Debug, Clone)]
#[command(name = "yt-transcript-fetcher")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video id or URL (watch, youtu.be, embed, shorts).
    video: String,

    /// Target caption language code.
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Txt)]
    format: Format,

    /// Include start timestamps where the format supports them.
    #[arg(short, long)]
    timestamps: bool,

    /// Keep segments starting at or after this offset (SS, M:SS, or H:MM:SS).
    #[arg(long)]
    from: Option<String>,

    /// Keep segments starting at or before this offset (SS, M:SS, or H:MM:SS).
    #[arg(long)]
    to: Option<String>,

    /// Write the export here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base URL of the host site.
    #[arg(long, default_value = "https://www.youtube.com")]
    base_url: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Txt,
    Json,
    Srt,
    Vtt,
    Md,
    Csv,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_transcript_fetcher=info".into()),
        )
        .init();

    let args = Args::parse();

    let video_id = page::extract_video_id(&args.video)
        .ok_or_else(|| format!("not a recognizable video id or URL: {}", args.video))?;

    let config = Config {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        language: args.language.clone(),
        ..Config::default()
    };
    config.validate().map_err(|e| format!("invalid configuration: {e}"))?;

    let host = Arc::new(HttpTabHost::new()?);
    let source = Arc::new(InnertubeClient::new(&config)?);
    let coordinator = Coordinator::new(host, source, config);

    let result = coordinator.fetch_transcript(&video_id).await?;
    tracing::info!(
        title = %result.title,
        segments = result.transcript.len(),
        track = %result.track_name,
        "transcript fetched"
    );

    let options = ExportOptions {
        include_timestamps: args.timestamps,
        start: args.from.as_deref().map(export::parse_timestamp),
        end: args.to.as_deref().map(export::parse_timestamp),
    };
    let content = match args.format {
        Format::Txt => export::to_text(&result.transcript, &options),
        Format::Json => export::to_json(&result.title, &result.transcript, &options),
        Format::Srt => export::to_srt(&result.transcript, &options),
        Format::Vtt => export::to_vtt(&result.transcript, &options),
        Format::Md => export::to_markdown(&result.title, &result.transcript, &options),
        Format::Csv => export::to_csv(&result.transcript, &options),
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, content)?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{content}"),
    }

    Ok(())
}
