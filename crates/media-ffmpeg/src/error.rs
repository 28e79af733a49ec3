use std::fmt::{Display, Formatter};
use std::process::ExitStatus;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, MediaFfmpegError>;

/// Error type for probing/decoding operations backed by FFmpeg CLI tools.
#[derive(Debug)]
pub enum MediaFfmpegError {
    InvalidTimestampSeconds(f64),
    InvalidFrameSize {
        width: u32,
        height: u32,
    },
    MissingVideoStream(String),
    MissingVideoDimensions(String),
    NoFrameDecoded {
        source: String,
        at_seconds: f64,
    },
    Io {
        context: &'static str,
        source: std::io::Error,
    },
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    Utf8(std::string::FromUtf8Error),
    Parse {
        context: &'static str,
        value: String,
    },
}

impl MediaFfmpegError {
    /// Returns the captured stderr when a CLI tool exited unsuccessfully.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Returns true when the CLI tool was terminated by a signal instead of
    /// exiting on its own.
    pub fn was_terminated(&self) -> bool {
        matches!(self, Self::CommandFailed { status, .. } if status.code().is_none())
    }
}

impl Display for MediaFfmpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestampSeconds(value) => {
                write!(f, "invalid timestamp seconds: {value}")
            }
            Self::InvalidFrameSize { width, height } => {
                write!(f, "invalid frame size: {width}x{height}")
            }
            Self::MissingVideoStream(source) => {
                write!(f, "video stream not found: {source}")
            }
            Self::MissingVideoDimensions(source) => {
                write!(f, "video dimensions missing: {source}")
            }
            Self::NoFrameDecoded { source, at_seconds } => {
                write!(f, "no frame decoded at {at_seconds}s: {source}")
            }
            Self::Io { context, source } => {
                write!(f, "{context}: {source}")
            }
            Self::CommandFailed {
                command,
                status,
                stderr,
            } => {
                write!(
                    f,
                    "command failed ({status}): {command}; stderr: {}",
                    stderr.trim()
                )
            }
            Self::Utf8(err) => write!(f, "utf8 decode error: {err}"),
            Self::Parse { context, value } => {
                write!(f, "parse error ({context}): {value}")
            }
        }
    }
}

impl std::error::Error for MediaFfmpegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for MediaFfmpegError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}
