use std::sync::Arc;

use media_ffmpeg::{FrameSize, MediaFfmpegError, MediaInfo};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::playback::{MediaErrorCode, MediaMetadata, VideoTrackInfo};
use crate::source::VideoSource;

/// RGBA preview frame passed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<[u8]>,
}

/// Media element operations required by the editor.
///
/// Implementations may block; they are driven from a worker thread.
pub trait MediaBackend {
    /// Opens `source` and reads the metadata needed for playback.
    fn probe(&self, source: &VideoSource) -> Result<MediaMetadata>;

    /// Decodes one frame around `at_seconds`, scaled to `width`x`height`.
    fn decode_preview_frame(
        &self,
        source: &VideoSource,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> Result<PreviewFrame>;
}

/// FFmpeg CLI-backed backend used by production wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegMediaBackend;

impl MediaBackend for FfmpegMediaBackend {
    fn probe(&self, source: &VideoSource) -> Result<MediaMetadata> {
        let info = media_ffmpeg::probe_media(source.as_str())?;
        metadata_from_probe(&info)
    }

    fn decode_preview_frame(
        &self,
        source: &VideoSource,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> Result<PreviewFrame> {
        let frame = media_ffmpeg::decode_video_frame_at(
            source.as_str(),
            at_seconds,
            FrameSize { width, height },
        )?;
        Ok(PreviewFrame {
            width: frame.width,
            height: frame.height,
            bytes: Arc::from(frame.rgba),
        })
    }
}

/// Reduces probe output to playback metadata.
///
/// A source without a video stream is rejected so it surfaces as an
/// unsupported-source load error.
pub fn metadata_from_probe(info: &MediaInfo) -> Result<MediaMetadata> {
    let stream = info
        .first_video()
        .ok_or_else(|| MediaFfmpegError::MissingVideoStream(info.source.clone()))?;
    let missing = || MediaFfmpegError::MissingVideoDimensions(info.source.clone());

    Ok(MediaMetadata {
        duration_seconds: info
            .duration_seconds
            .filter(|duration| duration.is_finite() && *duration > 0.0),
        video: VideoTrackInfo {
            width: stream.width.ok_or_else(missing)?,
            height: stream.height.ok_or_else(missing)?,
            codec: stream.codec_name.clone(),
        },
    })
}

/// Maps a backend load error to the media element error code it stands for.
///
/// Returns `None` when the failure has no matching code, which surfaces as
/// the generic load message.
pub fn classify_load_error(error: &EngineError) -> Option<MediaErrorCode> {
    let EngineError::Media(media) = error else {
        return None;
    };
    if media.was_terminated() {
        return Some(MediaErrorCode::Aborted);
    }

    if let Some(stderr) = media.stderr() {
        return classify_stderr(stderr);
    }

    match media {
        MediaFfmpegError::MissingVideoStream(_) => Some(MediaErrorCode::SrcNotSupported),
        MediaFfmpegError::MissingVideoDimensions(_) | MediaFfmpegError::Parse { .. } => {
            Some(MediaErrorCode::Decode)
        }
        _ => None,
    }
}

const SRC_NOT_SUPPORTED_PATTERNS: &[&str] = &[
    "protocol not found",
    "no such file or directory",
    "server returned 404",
    "server returned 403",
    "server returned 401",
    "server returned 4xx",
];

const NETWORK_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timed out",
    "failed to resolve",
    "name or service not known",
    "network is unreachable",
    "server returned",
    "http error",
    "input/output error",
];

const DECODE_PATTERNS: &[&str] = &[
    "invalid data found when processing input",
    "moov atom not found",
    "could not find codec parameters",
    "error while decoding",
];

fn classify_stderr(stderr: &str) -> Option<MediaErrorCode> {
    let lower = stderr.to_ascii_lowercase();
    let matches_any = |patterns: &[&str]| patterns.iter().any(|pattern| lower.contains(pattern));

    if matches_any(SRC_NOT_SUPPORTED_PATTERNS) {
        Some(MediaErrorCode::SrcNotSupported)
    } else if matches_any(NETWORK_PATTERNS) {
        Some(MediaErrorCode::Network)
    } else if matches_any(DECODE_PATTERNS) {
        Some(MediaErrorCode::Decode)
    } else {
        None
    }
}

/// Work sent to the media worker. `generation` identifies the load it
/// belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRequest {
    Load {
        generation: u64,
        source: VideoSource,
    },
    DecodeFrame {
        generation: u64,
        source: VideoSource,
        at_seconds: f64,
        width: u32,
        height: u32,
    },
}

/// Media element notifications produced by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaNotification {
    Loaded {
        generation: u64,
        metadata: MediaMetadata,
    },
    LoadFailed {
        generation: u64,
        code: Option<MediaErrorCode>,
        detail: String,
    },
    FrameReady {
        generation: u64,
        at_seconds: f64,
        frame: PreviewFrame,
    },
    FrameFailed {
        generation: u64,
        at_seconds: f64,
        detail: String,
    },
}

impl MediaNotification {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Loaded { generation, .. }
            | Self::LoadFailed { generation, .. }
            | Self::FrameReady { generation, .. }
            | Self::FrameFailed { generation, .. } => *generation,
        }
    }
}

/// Runs one request against `backend` and reports the outcome.
pub fn serve_request<M>(backend: &M, request: MediaRequest) -> MediaNotification
where
    M: MediaBackend + ?Sized,
{
    match request {
        MediaRequest::Load { generation, source } => match backend.probe(&source) {
            Ok(metadata) => MediaNotification::Loaded {
                generation,
                metadata,
            },
            Err(error) => {
                let code = classify_load_error(&error);
                warn!(generation, source = source.as_str(), %error, "probe failed");
                MediaNotification::LoadFailed {
                    generation,
                    code,
                    detail: error.to_string(),
                }
            }
        },
        MediaRequest::DecodeFrame {
            generation,
            source,
            at_seconds,
            width,
            height,
        } => match backend.decode_preview_frame(&source, at_seconds, width, height) {
            Ok(frame) => {
                debug!(generation, at_seconds, "preview frame decoded");
                MediaNotification::FrameReady {
                    generation,
                    at_seconds,
                    frame,
                }
            }
            Err(error) => MediaNotification::FrameFailed {
                generation,
                at_seconds,
                detail: error.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use media_ffmpeg::{MediaFfmpegError, MediaInfo, StreamInfo, StreamKind};

    use super::{
        MediaBackend, MediaNotification, MediaRequest, PreviewFrame, classify_load_error,
        classify_stderr, metadata_from_probe, serve_request,
    };
    use crate::error::{EngineError, Result};
    use crate::playback::{MediaErrorCode, MediaMetadata};
    use crate::source::VideoSource;

    fn stream(index: u32, kind: StreamKind, size: Option<(u32, u32)>) -> StreamInfo {
        StreamInfo {
            index,
            kind,
            codec_name: None,
            width: size.map(|(width, _)| width),
            height: size.map(|(_, height)| height),
        }
    }

    fn probed(streams: Vec<StreamInfo>, duration_seconds: Option<f64>) -> MediaInfo {
        MediaInfo {
            source: "https://example.com/clip.mp4".to_owned(),
            streams,
            duration_seconds,
        }
    }

    /// Probes every source as an audio-only file.
    struct AudioOnlyBackend;

    impl MediaBackend for AudioOnlyBackend {
        fn probe(&self, _source: &VideoSource) -> Result<MediaMetadata> {
            metadata_from_probe(&probed(
                vec![stream(0, StreamKind::Audio, None)],
                Some(30.0),
            ))
        }

        fn decode_preview_frame(
            &self,
            _source: &VideoSource,
            _at_seconds: f64,
            width: u32,
            height: u32,
        ) -> Result<PreviewFrame> {
            Ok(PreviewFrame {
                width,
                height,
                bytes: Arc::from(vec![0_u8; (width * height * 4) as usize]),
            })
        }
    }

    fn source() -> VideoSource {
        VideoSource::parse("https://example.com/clip.mp4").expect("valid url")
    }

    #[test]
    fn stderr_patterns_map_to_media_error_codes() {
        assert_eq!(
            classify_stderr("https://x/y.mp4: Connection refused"),
            Some(MediaErrorCode::Network)
        );
        assert_eq!(
            classify_stderr("Failed to resolve hostname nowhere.invalid"),
            Some(MediaErrorCode::Network)
        );
        assert_eq!(
            classify_stderr("HTTP error 404 Not Found\nServer returned 404 Not Found"),
            Some(MediaErrorCode::SrcNotSupported)
        );
        assert_eq!(
            classify_stderr("y.mp4: Invalid data found when processing input"),
            Some(MediaErrorCode::Decode)
        );
        assert_eq!(classify_stderr("something unexpected"), None);
    }

    #[test]
    fn probe_with_video_stream_yields_metadata() {
        let info = probed(
            vec![
                stream(0, StreamKind::Audio, None),
                stream(1, StreamKind::Video, Some((640, 360))),
            ],
            Some(0.0),
        );

        let metadata = metadata_from_probe(&info).expect("video source should load");

        assert_eq!((metadata.video.width, metadata.video.height), (640, 360));
        assert_eq!(metadata.duration_seconds, None);
    }

    #[test]
    fn probe_without_video_stream_is_unsupported_source() {
        let info = probed(vec![stream(0, StreamKind::Audio, None)], Some(12.0));

        let error = metadata_from_probe(&info).expect_err("audio-only source should fail");

        assert!(matches!(
            error,
            EngineError::Media(MediaFfmpegError::MissingVideoStream(_))
        ));
        assert_eq!(
            classify_load_error(&error),
            Some(MediaErrorCode::SrcNotSupported)
        );
    }

    #[test]
    fn video_stream_without_dimensions_is_decode_error() {
        let info = probed(vec![stream(0, StreamKind::Video, None)], Some(12.0));

        let error = metadata_from_probe(&info).expect_err("dimensions are required");

        assert_eq!(classify_load_error(&error), Some(MediaErrorCode::Decode));
    }

    #[cfg(unix)]
    #[test]
    fn failed_ffprobe_runs_are_classified_from_their_stderr() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let failed = |raw_status: i32, stderr: &str| {
            EngineError::Media(MediaFfmpegError::CommandFailed {
                command: "ffprobe".to_owned(),
                status: ExitStatus::from_raw(raw_status),
                stderr: stderr.to_owned(),
            })
        };

        assert_eq!(
            classify_load_error(&failed(1 << 8, "Connection timed out")),
            Some(MediaErrorCode::Network)
        );
        assert_eq!(
            classify_load_error(&failed(1 << 8, "clip.mp4: moov atom not found")),
            Some(MediaErrorCode::Decode)
        );
        assert_eq!(classify_load_error(&failed(1 << 8, "???")), None);
        assert_eq!(
            classify_load_error(&failed(9, "")),
            Some(MediaErrorCode::Aborted)
        );
    }

    #[test]
    fn non_media_errors_have_no_code() {
        assert_eq!(classify_load_error(&EngineError::NoVideoSource), None);
        assert_eq!(
            classify_load_error(&EngineError::Media(MediaFfmpegError::Io {
                context: "run ffprobe",
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })),
            None
        );
    }

    #[test]
    fn failed_probe_becomes_load_failed_notification() {
        let notification = serve_request(
            &AudioOnlyBackend,
            MediaRequest::Load {
                generation: 4,
                source: source(),
            },
        );

        let MediaNotification::LoadFailed {
            generation, code, ..
        } = notification
        else {
            panic!("expected LoadFailed");
        };
        assert_eq!(generation, 4);
        assert_eq!(code, Some(MediaErrorCode::SrcNotSupported));
    }

    #[test]
    fn decode_request_returns_frame_tagged_with_generation() {
        let notification = serve_request(
            &AudioOnlyBackend,
            MediaRequest::DecodeFrame {
                generation: 2,
                source: source(),
                at_seconds: 1.5,
                width: 4,
                height: 2,
            },
        );

        assert_eq!(notification.generation(), 2);
        let MediaNotification::FrameReady {
            at_seconds, frame, ..
        } = notification
        else {
            panic!("expected FrameReady");
        };
        assert_eq!(at_seconds, 1.5);
        assert_eq!(frame.bytes.len(), 32);
    }
}
