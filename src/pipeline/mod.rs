//! Pipeline orchestration: fetch → normalize → transcribe → translate.
//!
//! The orchestrator owns the temporary work area for one run and aggregates
//! every stage failure into a single uniformly-shaped [`PipelineResult`]; no
//! stage error ever propagates to the caller as a fault.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::audio::{AudioExtractor, FfmpegExtractor};
use crate::config::Config;
use crate::fetch::{MediaFetcher, YtDlpFetcher};
use crate::inference::{self, ModelCache, SpeechTask, WhisperLoader};
use crate::utils;

/// Source language for the transcription pass
const SOURCE_LANGUAGE: &str = "en";

/// Target language for the translation pass
const TARGET_LANGUAGE: &str = "es";

/// Result message for a URL rejected before any resource use
pub const INVALID_URL_ERROR: &str = "URL inválida";

/// Result message for the reserved, unimplemented remote backend
pub const REMOTE_NOT_IMPLEMENTED_ERROR: &str = "Modo remoto no implementado aún";

/// Stand-in text when the transcription pass produced nothing
pub const TRANSCRIBE_PLACEHOLDER: &str = "(No se pudo transcribir en inglés. Ver logs.)";

/// Stand-in text when the translation pass produced nothing
pub const TRANSLATE_PLACEHOLDER: &str = "(No se pudo traducir al español. Ver logs.)";

/// Aggregate error when one of the inference passes failed
pub const INFERENCE_ERROR: &str = "Fallo en pipeline de transcripción/traducción";

/// Inference backend selector.
///
/// Unrecognized values normalize to `Local`; `Remote` is a reserved
/// forward-compatible stub, not a functional path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Local,
    Remote,
}

impl Mode {
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "local" => Mode::Local,
            "remote" => Mode::Remote,
            other => {
                tracing::debug!("Unrecognized mode {other:?}, falling back to local");
                Mode::Local
            }
        }
    }
}

/// The sole output contract of the pipeline.
///
/// `ok` is true iff both inference passes produced text; any stage failure
/// yields `ok = false` with a human-readable `error` and the shape stays
/// identical regardless of which stage failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub ok: bool,
    pub transcript_en: Option<String>,
    pub transcript_es: Option<String>,
    pub error: Option<String>,
}

impl PipelineResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            transcript_en: None,
            transcript_es: None,
            error: Some(error.into()),
        }
    }
}

/// Scoped temporary directory holding the two intermediate artifacts of one
/// pipeline run. Deleted with its contents when dropped, on every exit path.
struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    fn create() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("reelscribe-").tempdir()?;
        Ok(Self { dir })
    }

    fn video_path(&self) -> PathBuf {
        self.dir.path().join("reel.mp4")
    }

    fn audio_path(&self) -> PathBuf {
        self.dir.path().join("audio.wav")
    }
}

/// Main transcription/translation pipeline
pub struct ReelPipeline {
    fetcher: Box<dyn MediaFetcher>,
    extractor: Box<dyn AudioExtractor>,
    model_cache: ModelCache,
}

impl ReelPipeline {
    /// Create a pipeline wired to the real external tools and whisper loader
    pub fn new(config: &Config) -> Self {
        Self {
            fetcher: Box::new(YtDlpFetcher::new(&config.tools.yt_dlp_path)),
            extractor: Box::new(FfmpegExtractor::new(&config.tools.ffmpeg_path)),
            model_cache: ModelCache::new(Box::new(WhisperLoader::new(config.model.clone()))),
        }
    }

    /// Create a pipeline from explicit parts (used to inject test doubles)
    pub fn with_parts(
        fetcher: Box<dyn MediaFetcher>,
        extractor: Box<dyn AudioExtractor>,
        model_cache: ModelCache,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            model_cache,
        }
    }

    /// Public entry point: validate input, then dispatch on the backend mode.
    pub async fn invoke(&self, url: &str, mode: &str) -> PipelineResult {
        if utils::validate_url(url).is_err() {
            return PipelineResult::failure(INVALID_URL_ERROR);
        }

        match Mode::normalize(mode) {
            Mode::Local => self.run_local(url).await,
            Mode::Remote => PipelineResult::failure(REMOTE_NOT_IMPLEMENTED_ERROR),
        }
    }

    /// Run the local pipeline: fetch, normalize, then two inference passes
    /// over the same normalized audio.
    async fn run_local(&self, url: &str) -> PipelineResult {
        let work = match WorkArea::create() {
            Ok(work) => work,
            Err(e) => return PipelineResult::failure(format!("Error en pipeline: {e}")),
        };

        tracing::info!("Downloading video: {}", url);
        if let Err(e) = self.fetcher.fetch(url, &work.video_path()).await {
            return PipelineResult::failure(format!("Descarga fallida: {e}"));
        }

        tracing::info!("Extracting audio to: {}", work.audio_path().display());
        if let Err(e) = self
            .extractor
            .extract(&work.video_path(), &work.audio_path())
            .await
        {
            return PipelineResult::failure(format!("Extracción de audio fallida: {e}"));
        }

        let transcript = inference::run_task(
            &self.model_cache,
            &work.audio_path(),
            SpeechTask::transcribe(SOURCE_LANGUAGE),
        )
        .await;

        let translation = inference::run_task(
            &self.model_cache,
            &work.audio_path(),
            SpeechTask::translate(TARGET_LANGUAGE),
        )
        .await;

        // ok reflects the raw inference outcomes; the returned text fields
        // carry placeholders for whichever pass failed.
        let ok = transcript.is_ok() && translation.is_ok();

        PipelineResult {
            ok,
            transcript_en: Some(transcript.unwrap_or_else(|_| TRANSCRIBE_PLACEHOLDER.to_string())),
            transcript_es: Some(translation.unwrap_or_else(|_| TRANSLATE_PLACEHOLDER.to_string())),
            error: if ok {
                None
            } else {
                Some(INFERENCE_ERROR.to_string())
            },
        }
    }
}
