//! Speech inference: the process-wide model cache and the adapter that runs
//! the cached backend against a fixed audio file.
//!
//! The heavyweight model is loaded at most once per process. A failed load is
//! cached as a permanent "unavailable" sentinel so later requests do not
//! repeat an expensive doomed initialization.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub mod whisper;

pub use whisper::WhisperLoader;

/// One timed text segment as emitted by the speech backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
}

/// Which operation the speech backend performs over the audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechTask {
    /// Same-language transcription in the given source language
    Transcribe { language: String },

    /// Cross-language translation into the given target language
    Translate { target: String },
}

impl SpeechTask {
    pub fn transcribe(language: &str) -> Self {
        Self::Transcribe {
            language: language.to_string(),
        }
    }

    pub fn translate(target: &str) -> Self {
        Self::Translate {
            target: target.to_string(),
        }
    }
}

/// A loaded speech model that can run one task over one audio file.
///
/// Implementations run synchronously; callers dispatch them onto the blocking
/// thread pool.
#[cfg_attr(test, mockall::automock)]
pub trait SpeechBackend: Send + Sync {
    fn run(&self, audio: &Path, task: &SpeechTask) -> anyhow::Result<Vec<Segment>>;
}

/// One-shot initializer for a speech backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Arc<dyn SpeechBackend>>;
}

/// Failure of a single inference call.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("speech model unavailable")]
    Unavailable,

    #[error("inference failed: {0}")]
    Backend(String),
}

/// Holds at most one loaded speech backend for the process lifetime.
///
/// The first `get` drives the loader; every later call returns the cached
/// outcome, including the `None` sentinel left behind by a failed load.
/// Initialization is guarded, so concurrent first calls cannot race.
pub struct ModelCache {
    loader: Box<dyn BackendLoader>,
    slot: OnceCell<Option<Arc<dyn SpeechBackend>>>,
}

impl ModelCache {
    pub fn new(loader: Box<dyn BackendLoader>) -> Self {
        Self {
            loader,
            slot: OnceCell::new(),
        }
    }

    /// A cache pre-seeded with an already loaded backend. The loader is never
    /// consulted.
    pub fn preloaded(backend: Arc<dyn SpeechBackend>) -> Self {
        Self {
            loader: Box::new(NullLoader),
            slot: OnceCell::new_with(Some(Some(backend))),
        }
    }

    /// A cache pre-seeded with the permanent "no model" sentinel.
    pub fn unavailable() -> Self {
        Self {
            loader: Box::new(NullLoader),
            slot: OnceCell::new_with(Some(None)),
        }
    }

    /// Return the cached backend, loading it on first use.
    pub async fn get(&self) -> Option<Arc<dyn SpeechBackend>> {
        self.slot
            .get_or_init(|| async {
                match self.loader.load().await {
                    Ok(backend) => {
                        tracing::info!("Speech model loaded");
                        Some(backend)
                    }
                    Err(e) => {
                        tracing::error!("Failed to load speech model: {e:#}");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

/// Placeholder loader for pre-seeded caches
struct NullLoader;

#[async_trait]
impl BackendLoader for NullLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn SpeechBackend>> {
        anyhow::bail!("no loader configured")
    }
}

/// Run the cached model against `audio` under `task` and flatten the emitted
/// segments into one contiguous string.
///
/// Segment text is concatenated in emission order with no separator; the
/// backend's own tokenization and punctuation are preserved as-is. Backend
/// errors are caught and logged here, never propagated.
pub async fn run_task(
    cache: &ModelCache,
    audio: &Path,
    task: SpeechTask,
) -> Result<String, InferenceError> {
    let Some(backend) = cache.get().await else {
        return Err(InferenceError::Unavailable);
    };

    let audio: PathBuf = audio.to_path_buf();
    let joined = tokio::task::spawn_blocking(move || backend.run(&audio, &task)).await;

    match joined {
        Ok(Ok(segments)) => Ok(segments.into_iter().map(|s| s.text).collect()),
        Ok(Err(e)) => {
            tracing::warn!("Speech inference failed: {e:#}");
            Err(InferenceError::Backend(e.to_string()))
        }
        Err(e) => {
            tracing::warn!("Speech inference task aborted: {e}");
            Err(InferenceError::Backend(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .map(|t| Segment {
                text: t.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn run_task_concatenates_segments_without_separator() {
        let mut backend = MockSpeechBackend::new();
        backend
            .expect_run()
            .returning(|_, _| Ok(segments(&[" Hello", " world", "."])));

        let cache = ModelCache::preloaded(Arc::new(backend));
        let text = run_task(&cache, Path::new("/tmp/audio.wav"), SpeechTask::transcribe("en"))
            .await
            .unwrap();

        assert_eq!(text, " Hello world.");
    }

    #[tokio::test]
    async fn run_task_passes_the_requested_task_through() {
        let mut backend = MockSpeechBackend::new();
        backend
            .expect_run()
            .withf(|_, task| *task == SpeechTask::translate("es"))
            .returning(|_, _| Ok(segments(&["hola"])));

        let cache = ModelCache::preloaded(Arc::new(backend));
        let text = run_task(&cache, Path::new("/tmp/audio.wav"), SpeechTask::translate("es"))
            .await
            .unwrap();

        assert_eq!(text, "hola");
    }

    #[tokio::test]
    async fn unavailable_cache_short_circuits() {
        let cache = ModelCache::unavailable();
        let err = run_task(&cache, Path::new("/tmp/audio.wav"), SpeechTask::transcribe("en"))
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::Unavailable));
    }

    #[tokio::test]
    async fn backend_errors_surface_as_inference_failures() {
        let mut backend = MockSpeechBackend::new();
        backend
            .expect_run()
            .returning(|_, _| Err(anyhow::anyhow!("decoder exploded")));

        let cache = ModelCache::preloaded(Arc::new(backend));
        let err = run_task(&cache, Path::new("/tmp/audio.wav"), SpeechTask::transcribe("en"))
            .await
            .unwrap_err();

        match err {
            InferenceError::Backend(message) => assert!(message.contains("decoder exploded")),
            other => panic!("expected Backend error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn loader_runs_once_for_repeated_gets() {
        let mut backend = MockSpeechBackend::new();
        backend.expect_run().returning(|_, _| Ok(segments(&["hi"])));
        let backend: Arc<dyn SpeechBackend> = Arc::new(backend);

        let mut loader = MockBackendLoader::new();
        let handle = backend.clone();
        loader
            .expect_load()
            .times(1)
            .returning(move || Ok(handle.clone()));

        let cache = ModelCache::new(Box::new(loader));
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_load_is_cached_and_never_retried() {
        let mut loader = MockBackendLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("disk full")));

        let cache = ModelCache::new(Box::new(loader));
        assert!(cache.get().await.is_none());
        // the sentinel is returned without a second load attempt
        assert!(cache.get().await.is_none());
    }
}
