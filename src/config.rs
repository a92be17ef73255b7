//! Run configuration and credentials.
//!
//! Everything here is checked before any rendering starts; a bad value is a
//! [`WrapError::Config`] and the process exits with status 2.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike as _;

use crate::audio::narration::ELEVENLABS_DEFAULT_VOICE;
use crate::audio::track::MusicSource;
use crate::foundation::error::{WrapError, WrapResult};
use crate::render::text::FontSource;
use crate::scene::model::SceneKind;

/// First year a wrap may be requested for.
pub const MIN_YEAR: i32 = 2005;
/// Environment variable naming a font file.
pub const FONT_ENV: &str = "WRAPREEL_FONT";
/// Environment variable carrying the text-to-speech API key.
pub const ELEVENLABS_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Everything one invocation needs.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub year: i32,
    /// Narration and music. When off the video carries a silent track.
    pub audio_enabled: bool,
    pub music: MusicSource,
    pub voice_id: String,
    /// File name of the video, with or without `.mp4`.
    pub output_name: String,
    pub output_dir: PathBuf,
    pub static_mode: bool,
    pub emit_preview: bool,
    /// Scene crossfade in seconds, `0` for hard cuts.
    pub crossfade: f64,
    pub font_path: Option<PathBuf>,
    pub background_image: Option<PathBuf>,
    /// Repository whose history is collected.
    pub repo_path: PathBuf,
    /// Load a precomputed snapshot instead of reading history.
    pub stats_path: Option<PathBuf>,
    pub fetch_pull_requests: bool,
    pub parallel: bool,
    pub threads: Option<usize>,
    /// Bound for every network call (narration, music download).
    pub network_timeout: Duration,
}

impl RunConfig {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            audio_enabled: true,
            music: MusicSource::None,
            voice_id: ELEVENLABS_DEFAULT_VOICE.to_string(),
            output_name: format!("github-wrapped-{year}"),
            output_dir: PathBuf::from("."),
            static_mode: false,
            emit_preview: false,
            crossfade: 0.0,
            font_path: None,
            background_image: None,
            repo_path: PathBuf::from("."),
            stats_path: None,
            fetch_pull_requests: true,
            parallel: true,
            threads: None,
            network_timeout: Duration::from_secs(30),
        }
    }

    /// Fail fast on anything that would only surface halfway through a render.
    pub fn validate(&self) -> WrapResult<()> {
        let current = chrono::Local::now().year();
        if !(MIN_YEAR..=current).contains(&self.year) {
            return Err(WrapError::config(format!(
                "year {} is outside {MIN_YEAR}..={current}",
                self.year
            )));
        }

        let name = self.output_name.trim();
        if name.is_empty() {
            return Err(WrapError::config("output name must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(WrapError::config(format!(
                "output name '{name}' must be a plain file name"
            )));
        }

        if !self.crossfade.is_finite() || self.crossfade < 0.0 {
            return Err(WrapError::config(format!(
                "crossfade must be a finite number >= 0, got {}",
                self.crossfade
            )));
        }
        let max_crossfade = SceneKind::DEFAULT_ORDER
            .iter()
            .map(|k| k.default_duration())
            .fold(f64::INFINITY, f64::min)
            / 2.0;
        if self.crossfade > max_crossfade {
            return Err(WrapError::config(format!(
                "crossfade {}s is longer than half of the shortest scene ({max_crossfade}s allowed)",
                self.crossfade
            )));
        }
        if self.threads == Some(0) {
            return Err(WrapError::config("threads must be >= 1 when set"));
        }
        if self.voice_id.trim().is_empty() {
            return Err(WrapError::config("voice id must not be empty"));
        }

        match &self.music {
            MusicSource::File(path) => readable_file(path, "music file")?,
            MusicSource::Url(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(WrapError::config(format!(
                        "music url '{url}' must be http(s)"
                    )));
                }
            }
            MusicSource::None => {}
        }
        if let Some(path) = &self.font_path {
            readable_file(path, "font")?;
        }
        if let Some(path) = &self.background_image {
            readable_file(path, "background image")?;
        }
        if let Some(path) = &self.stats_path {
            readable_file(path, "stats file")?;
        }
        Ok(())
    }

    /// Final video path inside `output_dir`.
    pub fn output_path(&self) -> PathBuf {
        let name = self.output_name.trim();
        let file = if Path::new(name)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("mp4"))
        {
            name.to_string()
        } else {
            format!("{name}.mp4")
        };
        self.output_dir.join(file)
    }

    /// Font from `--font`, then the environment, then well-known system paths.
    pub fn resolve_font(&self) -> WrapResult<Option<FontSource>> {
        self.resolve_font_with(|k| std::env::var(k).ok())
    }

    pub fn resolve_font_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> WrapResult<Option<FontSource>> {
        if let Some(path) = &self.font_path {
            return FontSource::from_path(path).map(Some);
        }
        if let Some(path) = lookup(FONT_ENV).filter(|p| !p.trim().is_empty()) {
            return FontSource::from_path(Path::new(&path)).map(Some);
        }
        Ok(FontSource::discover())
    }
}

fn readable_file(path: &Path, what: &str) -> WrapResult<()> {
    std::fs::File::open(path)
        .and_then(|f| f.metadata())
        .map_err(|e| WrapError::config(format!("{what} '{}' is not readable: {e}", path.display())))
        .and_then(|m| {
            if m.is_file() {
                Ok(())
            } else {
                Err(WrapError::config(format!(
                    "{what} '{}' is not a file",
                    path.display()
                )))
            }
        })
}

/// Secrets read from the environment (and an optional `.env` file).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub elevenlabs_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "elevenlabs_api_key",
                &self.elevenlabs_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            elevenlabs_api_key: lookup(ELEVENLABS_KEY_ENV)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
