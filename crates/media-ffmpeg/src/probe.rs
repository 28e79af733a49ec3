use std::collections::HashMap;
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};

/// Stream kind discovered by probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// Stream metadata read from `ffprobe`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub index: u32,
    pub kind: StreamKind,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Media probe result for one URL or path.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub source: String,
    pub streams: Vec<StreamInfo>,
    pub duration_seconds: Option<f64>,
}

impl MediaInfo {
    /// Returns the first video stream.
    ///
    /// # Example
    /// ```no_run
    /// use media_ffmpeg::probe_media;
    ///
    /// let info = probe_media("https://example.com/clip.mp4").expect("probe should succeed");
    /// let _video = info.first_video().expect("video stream exists");
    /// ```
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|stream| stream.kind == StreamKind::Video)
    }
}

/// Probes a media URL or path via `ffprobe`.
///
/// Streams and container duration are read in a single invocation so remote
/// sources are only opened once.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::probe_media;
///
/// let info = probe_media("sample.mp4").expect("probe should succeed");
/// assert!(!info.streams.is_empty());
/// ```
pub fn probe_media(source: &str) -> Result<MediaInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=index,codec_type,codec_name,width,height:format=duration",
            "-of",
            "compact=p=0:nk=0",
        ])
        .arg(source)
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffprobe",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffprobe {source}"),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8(output.stdout)?;
    parse_probe_output(source, &stdout)
}

pub(crate) fn parse_probe_output(source: &str, stdout: &str) -> Result<MediaInfo> {
    let mut streams = Vec::new();
    let mut duration_seconds = None;

    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        let fields = parse_fields(line)?;
        if fields.contains_key("codec_type") {
            streams.push(parse_stream(line, &fields)?);
        } else if fields.contains_key("duration") {
            duration_seconds =
                parse_optional_f64(fields.get("duration").copied(), "format duration seconds")?;
        }
    }

    if streams.is_empty() {
        return Err(MediaFfmpegError::Parse {
            context: "streams",
            value: "no streams found".to_string(),
        });
    }

    Ok(MediaInfo {
        source: source.to_string(),
        streams,
        duration_seconds,
    })
}

fn parse_fields(line: &str) -> Result<HashMap<&str, &str>> {
    let mut map = HashMap::new();
    for field in line.split('|') {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| MediaFfmpegError::Parse {
                context: "probe field",
                value: field.to_string(),
            })?;
        map.insert(key.trim(), unquote(value.trim()));
    }
    Ok(map)
}

fn parse_stream(line: &str, map: &HashMap<&str, &str>) -> Result<StreamInfo> {
    let kind = match map.get("codec_type").copied() {
        Some("video") => StreamKind::Video,
        Some("audio") => StreamKind::Audio,
        _ => StreamKind::Other,
    };

    let index = parse_optional_u32(map.get("index").copied(), "stream index")?.ok_or_else(|| {
        MediaFfmpegError::Parse {
            context: "stream index",
            value: line.to_string(),
        }
    })?;

    Ok(StreamInfo {
        index,
        kind,
        codec_name: map
            .get("codec_name")
            .filter(|value| !value.is_empty() && **value != "N/A")
            .map(|value| value.to_string()),
        width: parse_optional_u32(map.get("width").copied(), "width")?,
        height: parse_optional_u32(map.get("height").copied(), "height")?,
    })
}

fn parse_optional_u32(value: Option<&str>, context: &'static str) -> Result<Option<u32>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.is_empty() || raw == "N/A" {
        return Ok(None);
    }

    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: raw.to_string(),
        })
}

fn parse_optional_f64(value: Option<&str>, context: &'static str) -> Result<Option<f64>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.is_empty() || raw == "N/A" {
        return Ok(None);
    }

    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: raw.to_string(),
        })
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}
