use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Failure of the audio normalization stage.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to run {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Tool(String),
}

/// Trait for extracting a canonical audio track from a video file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Strip the video stream and write mono 16 kHz 16-bit PCM audio to `dest`
    async fn extract(&self, video: &Path, dest: &Path) -> Result<(), ExtractError>;
}

/// Audio extractor backed by ffmpeg
pub struct FfmpegExtractor {
    program: String,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, dest: &Path) -> Result<(), ExtractError> {
        tracing::debug!("Extracting audio to: {}", dest.display());

        let output = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(dest)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExtractError::Launch {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            if message.is_empty() {
                return Err(ExtractError::Tool(format!(
                    "{} exited with {}",
                    self.program, output.status
                )));
            }
            return Err(ExtractError::Tool(message.to_string()));
        }

        Ok(())
    }
}
