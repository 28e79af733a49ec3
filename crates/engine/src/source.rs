use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EngineError, Result};

/// A syntactically valid video URL.
///
/// Only the syntax is checked here; reachability and content type are
/// discovered when the media backend opens the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    url: Url,
}

impl VideoSource {
    /// Parses user input as an absolute URL.
    ///
    /// # Example
    /// ```
    /// use engine::VideoSource;
    ///
    /// let source = VideoSource::parse("https://example.com/video.mp4").expect("valid url");
    /// assert_eq!(source.as_str(), "https://example.com/video.mp4");
    /// assert!(VideoSource::parse("video.mp4").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        Url::parse(input)
            .map(|url| Self { url })
            .map_err(|source| EngineError::InvalidVideoUrl {
                input: input.to_owned(),
                source,
            })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Returns true when `input` is a well-formed absolute URL.
pub fn is_valid_url(input: &str) -> bool {
    Url::parse(input).is_ok()
}

/// Named sample video offered next to the URL input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleVideo {
    pub title: String,
    pub url: String,
}

impl SampleVideo {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Public sample clips used when no settings file overrides them.
pub fn default_samples() -> Vec<SampleVideo> {
    vec![
        SampleVideo::new(
            "Big Buck Bunny",
            "https://storage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
        ),
        SampleVideo::new(
            "Elephants Dream",
            "https://storage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
        ),
        SampleVideo::new(
            "For Bigger Blazes",
            "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
        ),
    ]
}
