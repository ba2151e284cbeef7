use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "reelscribe",
    about = "Reel Scribe - Transcribe a short social video to English and translate it to Spanish",
    version,
    long_about = "Turns one short social-video URL into two aligned text artifacts: an English transcript and a Spanish translation of the same spoken content. Media is fetched with yt-dlp, normalized with ffmpeg, and transcribed with a locally cached Whisper model."
)]
pub struct Cli {
    /// Video URL to transcribe and translate
    #[arg(value_name = "URL")]
    pub url: String,

    /// Inference backend mode; unrecognized values fall back to "local"
    #[arg(short, long, default_value = "local", value_name = "MODE")]
    pub mode: String,

    /// Output format for the result
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Plain text
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_argument_is_required() {
        assert!(Cli::try_parse_from(["reelscribe"]).is_err());
    }

    #[test]
    fn defaults_are_local_and_json() {
        let cli = Cli::try_parse_from(["reelscribe", "https://example.com/v/1"]).unwrap();
        assert_eq!(cli.url, "https://example.com/v/1");
        assert_eq!(cli.mode, "local");
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(!cli.verbose);
    }

    #[test]
    fn mode_accepts_arbitrary_strings() {
        // normalization happens in the pipeline, not the parser
        let cli =
            Cli::try_parse_from(["reelscribe", "https://example.com/v/1", "--mode", "turbo"])
                .unwrap();
        assert_eq!(cli.mode, "turbo");
    }
}
