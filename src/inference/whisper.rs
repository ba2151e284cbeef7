//! Whisper backend: device selection, model resolution and inference via
//! whisper.cpp (whisper-rs).

use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{BackendLoader, Segment, SpeechBackend, SpeechTask};
use crate::config::ModelConfig;

/// Fixed model identifier; there is no user override.
pub const MODEL_NAME: &str = "large-v3";

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Inference device, selected once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Probe for a usable NVIDIA GPU. Any probe failure selects the CPU.
    pub async fn detect() -> Self {
        let probe = Command::new("nvidia-smi")
            .arg("--list-gpus")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match probe {
            Ok(output) if output.status.success() => Device::Cuda,
            _ => Device::Cpu,
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// Numeric precision tier of the model weights, a pure function of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Half-precision weights for GPU throughput
    Float16,
    /// Integer-quantized weights for CPU inference
    Quantized,
}

impl Precision {
    pub fn for_device(device: Device) -> Self {
        match device {
            Device::Cuda => Precision::Float16,
            Device::Cpu => Precision::Quantized,
        }
    }

    pub fn model_filename(&self) -> &'static str {
        match self {
            Precision::Float16 => "ggml-large-v3.bin",
            Precision::Quantized => "ggml-large-v3-q5_0.bin",
        }
    }

    pub fn download_url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.model_filename())
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Float16 => write!(f, "float16"),
            Precision::Quantized => write!(f, "q5_0"),
        }
    }
}

/// Loads the whisper model, downloading the weights on first use
pub struct WhisperLoader {
    model: ModelConfig,
}

impl WhisperLoader {
    pub fn new(model: ModelConfig) -> Self {
        Self { model }
    }
}

#[async_trait]
impl BackendLoader for WhisperLoader {
    async fn load(&self) -> Result<Arc<dyn SpeechBackend>> {
        let device = Device::detect().await;
        let precision = Precision::for_device(device);

        tracing::info!("Loading whisper model {} on {} ({})", MODEL_NAME, device, precision);

        let model_path = resolve_model(self.model.cache_dir.clone(), precision).await?;

        let backend = tokio::task::spawn_blocking(move || WhisperBackend::load(&model_path, device))
            .await
            .context("model load task failed")??;

        Ok(Arc::new(backend))
    }
}

/// Resolve the model file, checking the cache directory before downloading.
pub async fn resolve_model(cache_dir: Option<PathBuf>, precision: Precision) -> Result<PathBuf> {
    let dir = match cache_dir {
        Some(dir) => dir,
        None => dirs::cache_dir()
            .context("could not determine cache directory")?
            .join("reel-scribe")
            .join("models"),
    };

    let path = dir.join(precision.model_filename());
    if path.exists() {
        return Ok(path);
    }

    fs_err::create_dir_all(&dir)?;
    download_model(&precision.download_url(), &path).await?;

    Ok(path)
}

/// Download the model weights with progress tracking
async fn download_model(url: &str, dest: &Path) -> Result<()> {
    tracing::info!("Downloading whisper model from: {}", url);

    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to download model: HTTP {}", response.status());
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress = ProgressBar::new(total_size);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap()
    );
    progress.set_message("Downloading whisper model...");

    // Write to a partial file so an interrupted download is never mistaken
    // for a complete model.
    let part_path = dest.with_extension("bin.part");
    let mut file = fs_err::File::create(&part_path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    use futures_util::StreamExt;
    use std::io::Write;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress.set_position(downloaded);
    }

    progress.finish_with_message("Download complete");
    fs_err::rename(&part_path, dest)?;

    Ok(())
}

/// Speech backend running whisper.cpp over the normalized audio file
pub struct WhisperBackend {
    ctx: WhisperContext,
}

impl WhisperBackend {
    pub fn load(model_path: &Path, device: Device) -> Result<Self> {
        // Route whisper.cpp's own chatter through tracing
        whisper_rs::install_logging_hooks();

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(matches!(device, Device::Cuda));

        let path = model_path.to_str().context("model path is not valid UTF-8")?;
        let ctx = WhisperContext::new_with_params(path, ctx_params)
            .context("failed to load whisper model")?;

        Ok(Self { ctx })
    }
}

impl SpeechBackend for WhisperBackend {
    fn run(&self, audio: &Path, task: &SpeechTask) -> Result<Vec<Segment>> {
        let samples = read_pcm_samples(audio)?;

        let mut state = self
            .ctx
            .create_state()
            .context("failed to create whisper state")?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        match task {
            SpeechTask::Transcribe { language } => {
                params.set_language(Some(language.as_str()));
                params.set_translate(false);
            }
            SpeechTask::Translate { target } => {
                params.set_language(Some(target.as_str()));
                params.set_translate(true);
            }
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(worker_threads() as i32);

        state
            .full(params, &samples)
            .context("whisper inference failed")?;

        let mut segments = Vec::new();
        for i in 0..state.full_n_segments() {
            if let Some(segment) = state.get_segment(i) {
                if let Ok(text) = segment.to_str() {
                    segments.push(Segment {
                        text: text.to_string(),
                    });
                }
            }
        }

        Ok(segments)
    }
}

/// Decode the normalized WAV file into f32 samples for whisper.
///
/// The normalization stage guarantees mono 16 kHz 16-bit PCM; anything else
/// means the file was produced by something other than this pipeline.
fn read_pcm_samples(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != 16_000 || spec.bits_per_sample != 16 {
        anyhow::bail!(
            "unexpected audio format: {} channel(s), {} Hz, {} bits",
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample
        );
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<std::result::Result<Vec<f32>, hound::Error>>()
        .context("failed to decode audio samples")?;

    Ok(samples)
}

fn worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_follows_device() {
        assert_eq!(Precision::for_device(Device::Cuda), Precision::Float16);
        assert_eq!(Precision::for_device(Device::Cpu), Precision::Quantized);
    }

    #[test]
    fn model_filenames_carry_the_fixed_identifier() {
        assert_eq!(Precision::Float16.model_filename(), "ggml-large-v3.bin");
        assert_eq!(Precision::Quantized.model_filename(), "ggml-large-v3-q5_0.bin");
        assert!(Precision::Quantized.download_url().starts_with("https://"));
    }

    #[test]
    fn read_pcm_samples_decodes_canonical_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for value in [0i16, i16::MAX, i16::MIN, 1234] {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let samples = read_pcm_samples(&path).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 1.0);
        assert!(samples.iter().all(|s| (-1.5..=1.5).contains(s)));
    }

    #[test]
    fn read_pcm_samples_rejects_non_canonical_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let err = read_pcm_samples(&path).unwrap_err();
        assert!(err.to_string().contains("unexpected audio format"));
    }
}
