use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::caption::CaptionId;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by editor commands and caption operations.
#[derive(Debug)]
pub enum EngineError {
    InvalidVideoUrl {
        input: String,
        source: url::ParseError,
    },
    NoVideoSource,
    EmptyCaptionText,
    CaptionNotFound {
        id: CaptionId,
    },
    InvalidTimeInput {
        input: String,
    },
    SampleNotFound {
        index: usize,
    },
    SettingsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    SettingsSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVideoUrl { input, source } => {
                write!(f, "invalid video url {input:?}: {source}")
            }
            Self::NoVideoSource => write!(f, "no video url has been entered"),
            Self::EmptyCaptionText => write!(f, "caption text is empty"),
            Self::CaptionNotFound { id } => write!(f, "caption not found: {id}"),
            Self::InvalidTimeInput { input } => {
                write!(f, "invalid time input {input:?}: expected seconds")
            }
            Self::SampleNotFound { index } => write!(f, "sample video not found: {index}"),
            Self::SettingsIo { path, source } => {
                write!(f, "failed to read settings: {} ({source})", path.display())
            }
            Self::SettingsSerialization { path, source } => {
                write!(
                    f,
                    "settings deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::Media(err) => write!(f, "media backend error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidVideoUrl { source, .. } => Some(source),
            Self::SettingsIo { source, .. } => Some(source),
            Self::SettingsSerialization { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for EngineError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}
