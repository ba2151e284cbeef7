use anyhow::Result;
use url::Url;

use crate::config::ToolsConfig;

/// Validate that a URL is well-formed and uses HTTP(S)
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(tools: &ToolsConfig) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&tools.yt_dlp_path).await {
        missing.push(format!(
            "{} - required for video download",
            tools.yt_dlp_path
        ));
    }

    if !check_command_available(&tools.ffmpeg_path).await {
        missing.push(format!(
            "{} - required for audio extraction",
            tools.ffmpeg_path
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/v/123").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("").is_err());
        assert!(validate_url("   ").is_err());
    }

    #[tokio::test]
    async fn test_check_dependencies_reports_missing_tools() {
        let tools = ToolsConfig {
            yt_dlp_path: "reelscribe-no-such-tool".to_string(),
            ffmpeg_path: "reelscribe-no-such-tool-either".to_string(),
        };

        let missing = check_dependencies(&tools).await;
        assert_eq!(missing.len(), 2);
        assert!(missing[0].contains("video download"));
        assert!(missing[1].contains("audio extraction"));
    }
}
