use std::process::Command;

use crate::error::{MediaFfmpegError, Result};

/// Output size of a decoded frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Fits a `width`x`height` source into `max_width`, keeping the aspect
    /// ratio and rounding both sides to even values as scalers expect.
    ///
    /// Sources narrower than `max_width` keep their size.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::FrameSize;
    ///
    /// let size = FrameSize::fit(1920, 1080, 640).expect("valid size");
    /// assert_eq!(size, FrameSize { width: 640, height: 360 });
    /// ```
    pub fn fit(width: u32, height: u32, max_width: u32) -> Result<Self> {
        if width == 0 || height == 0 || max_width < 2 {
            return Err(MediaFfmpegError::InvalidFrameSize { width, height });
        }

        let target_width = width.min(max_width);
        let scaled_height =
            (u64::from(height) * u64::from(target_width) + u64::from(width) / 2) / u64::from(width);
        let target_height = u32::try_from(scaled_height)
            .map_err(|_| MediaFfmpegError::InvalidFrameSize { width, height })?;

        Ok(Self {
            width: round_even(target_width),
            height: round_even(target_height),
        })
    }

    /// Number of bytes in one RGBA frame of this size.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

fn round_even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// A decoded video frame in RGBA format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decodes the first video frame at-or-after `at_seconds`, scaled to `size`.
///
/// The seek is placed before the input so remote sources are read from the
/// nearest keyframe instead of from the beginning.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::{FrameSize, decode_video_frame_at};
///
/// let size = FrameSize { width: 320, height: 180 };
/// let frame = decode_video_frame_at("sample.mp4", 0.5, size)
///     .expect("decode should succeed");
/// assert_eq!(frame.rgba.len(), size.rgba_len());
/// ```
pub fn decode_video_frame_at(
    source: &str,
    at_seconds: f64,
    size: FrameSize,
) -> Result<DecodedVideoFrame> {
    if !at_seconds.is_finite() || at_seconds < 0.0 {
        return Err(MediaFfmpegError::InvalidTimestampSeconds(at_seconds));
    }
    if size.width == 0 || size.height == 0 {
        return Err(MediaFfmpegError::InvalidFrameSize {
            width: size.width,
            height: size.height,
        });
    }

    let rgba = decode_rgba_frame(source, at_seconds, size)?;
    if rgba.is_empty() {
        return Err(MediaFfmpegError::NoFrameDecoded {
            source: source.to_string(),
            at_seconds,
        });
    }

    let expected_size = size.rgba_len();
    if rgba.len() != expected_size {
        return Err(MediaFfmpegError::Parse {
            context: "decoded rgba size",
            value: format!("expected {expected_size} bytes, got {}", rgba.len()),
        });
    }

    Ok(DecodedVideoFrame {
        width: size.width,
        height: size.height,
        rgba,
    })
}

fn decode_rgba_frame(source: &str, at_seconds: f64, size: FrameSize) -> Result<Vec<u8>> {
    let filter = format!("scale={}:{}", size.width, size.height);
    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin"])
        .arg("-ss")
        .arg(format!("{at_seconds:.3}"))
        .arg("-i")
        .arg(source)
        .arg("-vf")
        .arg(&filter)
        .arg("-frames:v")
        .arg("1")
        .arg("-an")
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("rgba")
        .arg("-")
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffmpeg decode frame",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffmpeg decode frame {source}"),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}
