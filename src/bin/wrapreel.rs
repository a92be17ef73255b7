use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wrapreel::{Credentials, MusicSource, RunConfig, WrapError};

#[derive(Parser, Debug)]
#[command(name = "wrapreel", version, about = "Render a year-in-review video for a repository")]
struct Cli {
    /// Year to summarize.
    year: i32,

    /// Repository to read history from.
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Load statistics from a JSON snapshot instead of reading history.
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Skip the `gh` pull request query.
    #[arg(long, default_value_t = false)]
    no_prs: bool,

    /// Render without narration or music (the video keeps a silent track).
    #[arg(long, default_value_t = false)]
    no_audio: bool,

    /// Background music file.
    #[arg(long, conflicts_with = "music_url")]
    music: Option<PathBuf>,

    /// Background music URL.
    #[arg(long)]
    music_url: Option<String>,

    /// ElevenLabs voice id for narration.
    #[arg(long)]
    voice: Option<String>,

    /// Output file name (`.mp4` is appended when missing).
    #[arg(long)]
    output: Option<String>,

    /// Directory the video is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// One still frame per scene instead of animation.
    #[arg(long = "static", default_value_t = false)]
    static_mode: bool,

    /// Also write a short looping GIF preview.
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Crossfade between scenes, in seconds.
    #[arg(long, default_value_t = 0.0)]
    crossfade: f64,

    /// Font file for all text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Image used as every scene's backdrop.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Render frames on one thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Timeout for network calls, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let defaults = RunConfig::new(self.year);
        let music = match (self.music, self.music_url) {
            (Some(path), _) => MusicSource::File(path),
            (None, Some(url)) => MusicSource::Url(url),
            (None, None) => MusicSource::None,
        };
        RunConfig {
            audio_enabled: !self.no_audio,
            music,
            voice_id: self.voice.unwrap_or(defaults.voice_id.clone()),
            output_name: self.output.unwrap_or(defaults.output_name.clone()),
            output_dir: self.output_dir,
            static_mode: self.static_mode,
            emit_preview: self.preview,
            crossfade: self.crossfade,
            font_path: self.font,
            background_image: self.background,
            repo_path: self.repo,
            stats_path: self.stats,
            fetch_pull_requests: !self.no_prs,
            parallel: !self.sequential,
            threads: self.threads,
            network_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..defaults
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "wrapreel=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let credentials = Credentials::from_env();
    let config = cli.into_config();
    match wrapreel::run(&config, &credentials) {
        Ok(artifact) => {
            eprintln!("wrote {}", artifact.video_path.display());
            if let Some(preview) = artifact.preview_path {
                eprintln!("wrote {}", preview.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    }
}

fn report(err: &WrapError) -> ExitCode {
    tracing::error!(stage = err.stage(), "{err}");
    eprintln!("wrapreel: {} stage failed: {err}", err.stage());
    let code = u8::try_from(err.exit_code()).unwrap_or(1);
    ExitCode::from(code)
}
