use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Failure of the media acquisition stage.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to run {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Tool(String),
}

/// Trait for fetching remote media into a local file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the media behind `url` and write it to `dest`
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Media fetcher backed by yt-dlp
pub struct YtDlpFetcher {
    program: String,
}

impl YtDlpFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        tracing::debug!("Fetching media from: {}", url);

        // Arguments are passed as a literal vector; the URL is never
        // interpolated into a shell string.
        let output = Command::new(&self.program)
            .arg("-o")
            .arg(dest)
            .args(["--quiet", "--no-warnings"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| FetchError::Launch {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            if message.is_empty() {
                return Err(FetchError::Tool(format!(
                    "{} exited with {}",
                    self.program, output.status
                )));
            }
            return Err(FetchError::Tool(message.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tool_is_a_launch_error() {
        let fetcher = YtDlpFetcher::new("reelscribe-no-such-tool");
        let err = fetcher
            .fetch("https://example.com/v/1", Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Launch { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_tool_error() {
        // `false` ignores its arguments and always exits 1
        let fetcher = YtDlpFetcher::new("false");
        let err = fetcher
            .fetch("https://example.com/v/1", Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        match err {
            FetchError::Tool(message) => assert!(message.contains("exited with")),
            other => panic!("expected Tool error, got: {other:?}"),
        }
    }
}
