//! Reel Scribe - A Rust tool for transcribing and translating short social videos
//!
//! This library turns a single video URL into two aligned text artifacts: an English
//! transcript and a Spanish translation of the same spoken content, using yt-dlp for
//! media retrieval, ffmpeg for audio normalization, and a locally cached Whisper model
//! for inference.

pub mod audio;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use inference::{InferenceError, ModelCache, SpeechBackend, SpeechTask};
pub use pipeline::{Mode, PipelineResult, ReelPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
