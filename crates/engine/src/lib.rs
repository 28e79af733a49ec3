//! UI-agnostic state for the capedit caption editor.

pub mod api;
pub mod caption;
pub mod error;
pub mod media;
pub mod playback;
pub mod settings;
pub mod source;
pub mod time;

pub use api::{Command, Editor};
pub use caption::{Caption, CaptionId, CaptionIdGenerator, CaptionTrack};
pub use error::{EngineError, Result};
pub use media::{
    FfmpegMediaBackend, MediaBackend, MediaNotification, MediaRequest, PreviewFrame,
    serve_request,
};
pub use playback::{
    MediaErrorCode, MediaMetadata, PlayFailure, PlayOrigin, PlaybackController, ReadyState,
    VideoTrackInfo,
};
pub use settings::EditorSettings;
pub use source::{SampleVideo, VideoSource, is_valid_url};
pub use time::{format_duration, format_seconds, format_time, parse_seconds};
