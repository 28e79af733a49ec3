//! FFmpeg CLI wrappers used as the caption editor's media element.

mod decode;
mod error;
mod probe;

pub use decode::{DecodedVideoFrame, FrameSize, decode_video_frame_at};
pub use error::{MediaFfmpegError, Result};
pub use probe::{MediaInfo, StreamInfo, StreamKind, probe_media};
