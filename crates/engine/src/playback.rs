use tracing::{debug, info, warn};

pub const LOAD_ABORTED_MESSAGE: &str = "Video loading was aborted.";
pub const LOAD_NETWORK_MESSAGE: &str = "A network error occurred while loading the video.";
pub const LOAD_DECODE_MESSAGE: &str = "The video format is not supported by your browser.";
pub const LOAD_SRC_NOT_SUPPORTED_MESSAGE: &str = "The video format or source is not supported.";
pub const LOAD_GENERIC_MESSAGE: &str =
    "Could not load the video. Please check the URL and try again.";

pub const PLAY_NOT_SUPPORTED_MESSAGE: &str =
    "This video format is not supported by your browser. Try a different video or browser.";
pub const PLAY_NOT_ALLOWED_MESSAGE: &str =
    "Autoplay is blocked. Please interact with the video player first.";
pub const PLAY_GENERIC_MESSAGE: &str =
    "Could not play the video. Please check if the URL is correct and accessible.";

/// Media element error codes reported when a source fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    Aborted = 1,
    Network = 2,
    Decode = 3,
    SrcNotSupported = 4,
}

impl MediaErrorCode {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Aborted),
            2 => Some(Self::Network),
            3 => Some(Self::Decode),
            4 => Some(Self::SrcNotSupported),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// User-facing message for a load failure; `None` means no error code was
/// available.
///
/// # Example
/// ```
/// use engine::playback::{MediaErrorCode, load_error_message};
///
/// assert_eq!(
///     load_error_message(MediaErrorCode::from_code(2)),
///     "A network error occurred while loading the video."
/// );
/// ```
pub fn load_error_message(code: Option<MediaErrorCode>) -> &'static str {
    match code {
        Some(MediaErrorCode::Aborted) => LOAD_ABORTED_MESSAGE,
        Some(MediaErrorCode::Network) => LOAD_NETWORK_MESSAGE,
        Some(MediaErrorCode::Decode) => LOAD_DECODE_MESSAGE,
        Some(MediaErrorCode::SrcNotSupported) => LOAD_SRC_NOT_SUPPORTED_MESSAGE,
        None => LOAD_GENERIC_MESSAGE,
    }
}

/// Reason a play request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayFailure {
    NotSupported,
    NotAllowed,
    Other,
}

impl PlayFailure {
    pub fn message(self) -> &'static str {
        match self {
            Self::NotSupported => PLAY_NOT_SUPPORTED_MESSAGE,
            Self::NotAllowed => PLAY_NOT_ALLOWED_MESSAGE,
            Self::Other => PLAY_GENERIC_MESSAGE,
        }
    }
}

/// Who asked for playback to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOrigin {
    /// A gesture on the player, such as the play button.
    User,
    /// Playback started without a gesture, e.g. autoplay after load.
    Autoplay,
}

/// Video stream properties of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTrackInfo {
    pub width: u32,
    pub height: u32,
    pub codec: Option<String>,
}

/// Metadata known once a source has loaded. Sources without a video stream
/// fail to load instead.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub duration_seconds: Option<f64>,
    pub video: VideoTrackInfo,
}

/// Load state of the media element.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReadyState {
    #[default]
    Empty,
    Loading,
    Ready(MediaMetadata),
    Failed,
}

/// Result of advancing the playback clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockAdvance {
    pub time_changed: bool,
    pub ended: bool,
}

/// Transport state of the single media element.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    ready: ReadyState,
    is_playing: bool,
    current_time: f64,
    error: Option<&'static str>,
    user_activated: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_state(&self) -> &ReadyState {
        &self.ready
    }

    pub fn metadata(&self) -> Option<&MediaMetadata> {
        match &self.ready {
            ReadyState::Ready(metadata) => Some(metadata),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.metadata().and_then(|metadata| metadata.duration_seconds)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_loading(&self) -> bool {
        self.ready == ReadyState::Loading
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// User-visible error message, if one is shown.
    pub fn error_message(&self) -> Option<&'static str> {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Load start: a new source is being opened.
    pub fn begin_load(&mut self) {
        self.ready = ReadyState::Loading;
        self.is_playing = false;
        self.current_time = 0.0;
        self.error = None;
    }

    /// Loaded data: the source is ready to play.
    pub fn finish_load(&mut self, metadata: MediaMetadata) {
        info!(
            duration_seconds = ?metadata.duration_seconds,
            width = metadata.video.width,
            height = metadata.video.height,
            "media loaded"
        );
        self.ready = ReadyState::Ready(metadata);
        self.error = None;
    }

    /// Load error: shows the message mapped from `code` and forces paused.
    pub fn fail_load(&mut self, code: Option<MediaErrorCode>) {
        warn!(code = ?code.map(MediaErrorCode::code), "media load failed");
        self.ready = ReadyState::Failed;
        self.is_playing = false;
        self.error = Some(load_error_message(code));
    }

    /// Detaches the current source, e.g. when returning to URL entry.
    pub fn unload(&mut self) {
        self.ready = ReadyState::Empty;
        self.is_playing = false;
    }

    /// Flips between playing and paused for a gesture on the player.
    ///
    /// Returns whether playback is running afterwards.
    pub fn toggle(&mut self) -> Result<bool, PlayFailure> {
        if self.is_playing {
            self.pause();
            Ok(false)
        } else {
            self.play(PlayOrigin::User).map(|()| true)
        }
    }

    /// Starts playback. On failure the message is surfaced and the element
    /// stays paused.
    pub fn play(&mut self, origin: PlayOrigin) -> Result<(), PlayFailure> {
        if origin == PlayOrigin::User {
            self.user_activated = true;
        }
        self.error = None;

        match self.check_playable(origin) {
            Ok(()) => {
                if self.has_ended() {
                    self.current_time = 0.0;
                }
                self.is_playing = true;
                debug!(current_time = self.current_time, ?origin, "playback started");
                Ok(())
            }
            Err(failure) => {
                warn!(?failure, ?origin, "playback refused");
                self.is_playing = false;
                self.error = Some(failure.message());
                Err(failure)
            }
        }
    }

    pub fn pause(&mut self) {
        if self.is_playing {
            debug!(current_time = self.current_time, "playback paused");
        }
        self.is_playing = false;
    }

    /// Advances the clock by `elapsed_seconds` while playing.
    ///
    /// Reaching the known duration clamps the time and ends playback.
    pub fn advance(&mut self, elapsed_seconds: f64) -> ClockAdvance {
        if !self.is_playing || !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
            return ClockAdvance::default();
        }

        let mut next = self.current_time + elapsed_seconds;
        let mut ended = false;
        if let Some(duration) = self.duration() {
            if next >= duration {
                next = duration;
                ended = true;
            }
        }

        let time_changed = next != self.current_time;
        self.current_time = next;
        if ended {
            info!(current_time = next, "playback ended");
            self.is_playing = false;
        }

        ClockAdvance {
            time_changed,
            ended,
        }
    }

    /// Moves the playhead, clamped to `[0, duration]`. Returns the new time.
    pub fn seek(&mut self, seconds: f64) -> f64 {
        let upper = self.duration().unwrap_or(f64::MAX);
        let target = if seconds.is_finite() {
            seconds.clamp(0.0, upper)
        } else {
            0.0
        };
        self.current_time = target;
        target
    }

    fn check_playable(&self, origin: PlayOrigin) -> Result<(), PlayFailure> {
        if origin == PlayOrigin::Autoplay && !self.user_activated {
            return Err(PlayFailure::NotAllowed);
        }

        match &self.ready {
            ReadyState::Empty | ReadyState::Failed => Err(PlayFailure::NotSupported),
            ReadyState::Loading => Err(PlayFailure::Other),
            ReadyState::Ready(_) => Ok(()),
        }
    }

    fn has_ended(&self) -> bool {
        self.duration()
            .is_some_and(|duration| self.current_time >= duration)
    }
}
