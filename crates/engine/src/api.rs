use media_ffmpeg::FrameSize;
use tracing::{debug, info, warn};

use crate::caption::{Caption, CaptionId, CaptionIdGenerator, CaptionTrack};
use crate::error::{EngineError, Result};
use crate::media::{MediaNotification, MediaRequest, PreviewFrame};
use crate::playback::{PlayOrigin, PlaybackController, ReadyState};
use crate::settings::EditorSettings;
use crate::source::{SampleVideo, VideoSource, is_valid_url};
use crate::time::parse_seconds;

/// Commands accepted by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UrlInputChanged(String),
    /// Fills the URL input with one of the configured sample videos.
    SampleSelected(usize),
    LoadVideo,
    /// Returns to URL entry, detaching the current source.
    ChangeVideo,
    /// Dismisses the error overlay and returns to URL entry.
    TryAnotherUrl,
    TogglePlayback,
    /// Advances the playback clock by wall time elapsed since the last tick.
    AdvanceClock {
        elapsed_seconds: f64,
    },
    Seek {
        seconds: f64,
    },
    Media(MediaNotification),
    DraftChanged(String),
    /// Adds the draft as a caption starting at the current time.
    ///
    /// # Example
    /// ```
    /// use engine::{Command, Editor, EditorSettings};
    ///
    /// let mut editor = Editor::new(EditorSettings::default());
    /// editor
    ///     .handle_command(Command::UrlInputChanged("https://example.com/a.mp4".into()))
    ///     .unwrap();
    /// editor
    ///     .handle_command(Command::DraftChanged("Hello".into()))
    ///     .unwrap();
    /// editor.handle_command(Command::AddCaption).unwrap();
    ///
    /// let caption = &editor.captions().as_slice()[0];
    /// assert_eq!((caption.start_time, caption.end_time), (0.0, 5.0));
    /// ```
    AddCaption,
    EditCaptionText {
        id: CaptionId,
        text: String,
    },
    /// Sets a caption start from text typed in its time field.
    EditCaptionStart {
        id: CaptionId,
        input: String,
    },
    /// Sets a caption end from text typed in its time field.
    EditCaptionEnd {
        id: CaptionId,
        input: String,
    },
    SetStartToCurrentTime {
        id: CaptionId,
    },
    SetEndToCurrentTime {
        id: CaptionId,
    },
    DeleteCaption {
        id: CaptionId,
    },
}

/// Single owner of the caption editor state.
///
/// Every state transition happens inside [`Editor::handle_command`]; work
/// for the media element is returned as [`MediaRequest`]s and its outcome
/// comes back as [`Command::Media`].
#[derive(Debug)]
pub struct Editor {
    settings: EditorSettings,
    video_url: String,
    show_url_input: bool,
    source: Option<VideoSource>,
    generation: u64,
    playback: PlaybackController,
    captions: CaptionTrack,
    caption_ids: CaptionIdGenerator,
    draft: String,
    preview: Option<PreviewFrame>,
    pending_frame_at: Option<f64>,
    frame_request_in_flight: bool,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            video_url: String::new(),
            show_url_input: true,
            source: None,
            generation: 0,
            playback: PlaybackController::new(),
            captions: CaptionTrack::new(),
            caption_ids: CaptionIdGenerator::new(),
            draft: String::new(),
            preview: None,
            pending_frame_at: None,
            frame_request_in_flight: false,
        }
    }

    /// Applies one command and returns work for the media worker.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<MediaRequest>> {
        match command {
            Command::UrlInputChanged(url) => {
                self.video_url = url;
                Ok(Vec::new())
            }
            Command::SampleSelected(index) => self.select_sample(index),
            Command::LoadVideo => self.load_video(),
            Command::ChangeVideo => {
                self.return_to_url_input();
                Ok(Vec::new())
            }
            Command::TryAnotherUrl => {
                self.return_to_url_input();
                self.playback.clear_error();
                Ok(Vec::new())
            }
            Command::TogglePlayback => {
                let before = self.playback.current_time();
                // Refusals are surfaced through the playback error message.
                let _ = self.playback.toggle();
                if self.playback.current_time() != before {
                    Ok(self.request_frame(self.playback.current_time()))
                } else {
                    Ok(Vec::new())
                }
            }
            Command::AdvanceClock { elapsed_seconds } => {
                let advance = self.playback.advance(elapsed_seconds);
                if advance.time_changed {
                    Ok(self.request_frame(self.playback.current_time()))
                } else {
                    Ok(Vec::new())
                }
            }
            Command::Seek { seconds } => self.seek(seconds),
            Command::Media(notification) => Ok(self.apply_media_notification(notification)),
            Command::DraftChanged(text) => {
                self.draft = text;
                Ok(Vec::new())
            }
            Command::AddCaption => self.add_caption(),
            Command::EditCaptionText { id, text } => {
                self.captions.update_text(&id, text)?;
                Ok(Vec::new())
            }
            Command::EditCaptionStart { id, input } => {
                let start_time = parse_seconds(&input)?;
                self.captions.update_start_time(&id, start_time)?;
                Ok(Vec::new())
            }
            Command::EditCaptionEnd { id, input } => {
                let end_time = parse_seconds(&input)?;
                self.captions.update_end_time(&id, end_time)?;
                Ok(Vec::new())
            }
            Command::SetStartToCurrentTime { id } => {
                self.captions
                    .update_start_time(&id, self.playback.current_time())?;
                Ok(Vec::new())
            }
            Command::SetEndToCurrentTime { id } => {
                self.captions
                    .update_end_time(&id, self.playback.current_time())?;
                Ok(Vec::new())
            }
            Command::DeleteCaption { id } => {
                self.captions.delete(&id)?;
                Ok(Vec::new())
            }
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn samples(&self) -> &[SampleVideo] {
        &self.settings.samples
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn show_url_input(&self) -> bool {
        self.show_url_input
    }

    /// "Load Video" is enabled for a non-empty, well-formed URL.
    pub fn can_load_video(&self) -> bool {
        !self.video_url.is_empty() && is_valid_url(&self.video_url)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// "Add Caption" is enabled for non-blank text once a URL was entered.
    pub fn can_add_caption(&self) -> bool {
        !self.draft.trim().is_empty() && !self.video_url.is_empty()
    }

    pub fn captions(&self) -> &CaptionTrack {
        &self.captions
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn current_time(&self) -> f64 {
        self.playback.current_time()
    }

    /// Play/pause and caption overlays are hidden while loading or while an
    /// error is shown.
    pub fn shows_transport(&self) -> bool {
        !self.playback.is_loading() && self.playback.error_message().is_none()
    }

    /// Caption overlaid on the video at the current time.
    pub fn overlay_caption(&self) -> Option<&Caption> {
        if !self.shows_transport() {
            return None;
        }
        self.captions.active_at(self.playback.current_time())
    }

    pub fn preview_frame(&self) -> Option<&PreviewFrame> {
        self.preview.as_ref()
    }

    fn select_sample(&mut self, index: usize) -> Result<Vec<MediaRequest>> {
        let sample = self
            .settings
            .samples
            .get(index)
            .ok_or(EngineError::SampleNotFound { index })?;
        self.video_url = sample.url.clone();
        self.playback.clear_error();
        Ok(Vec::new())
    }

    fn load_video(&mut self) -> Result<Vec<MediaRequest>> {
        if self.video_url.is_empty() {
            return Err(EngineError::NoVideoSource);
        }
        let source = VideoSource::parse(&self.video_url)?;

        self.start_generation();
        self.show_url_input = false;
        self.source = Some(source.clone());
        self.playback.begin_load();
        info!(
            generation = self.generation,
            source = source.as_str(),
            "loading video"
        );

        Ok(vec![MediaRequest::Load {
            generation: self.generation,
            source,
        }])
    }

    fn return_to_url_input(&mut self) {
        self.show_url_input = true;
        self.start_generation();
        self.source = None;
        self.playback.unload();
    }

    fn start_generation(&mut self) {
        self.generation += 1;
        self.preview = None;
        self.pending_frame_at = None;
        self.frame_request_in_flight = false;
    }

    fn seek(&mut self, seconds: f64) -> Result<Vec<MediaRequest>> {
        if !matches!(self.playback.ready_state(), ReadyState::Ready(_)) {
            return Ok(Vec::new());
        }
        let at = self.playback.seek(seconds);
        Ok(self.request_frame(at))
    }

    fn add_caption(&mut self) -> Result<Vec<MediaRequest>> {
        if self.draft.trim().is_empty() {
            return Err(EngineError::EmptyCaptionText);
        }
        if self.video_url.is_empty() {
            return Err(EngineError::NoVideoSource);
        }

        let id = self.caption_ids.next_id();
        let text = std::mem::take(&mut self.draft);
        self.captions.add(
            id,
            text,
            self.playback.current_time(),
            self.settings.default_caption_seconds,
        );
        Ok(Vec::new())
    }

    fn apply_media_notification(&mut self, notification: MediaNotification) -> Vec<MediaRequest> {
        if notification.generation() != self.generation {
            debug!(
                stale = notification.generation(),
                current = self.generation,
                "dropping media notification from superseded load"
            );
            return Vec::new();
        }

        match notification {
            MediaNotification::Loaded { metadata, .. } => {
                self.playback.finish_load(metadata);
                if self.settings.autoplay {
                    let _ = self.playback.play(PlayOrigin::Autoplay);
                }
                self.request_frame(self.playback.current_time())
            }
            MediaNotification::LoadFailed { code, detail, .. } => {
                warn!(%detail, "video failed to load");
                self.playback.fail_load(code);
                self.preview = None;
                Vec::new()
            }
            MediaNotification::FrameReady { frame, .. } => {
                self.preview = Some(frame);
                self.frame_request_in_flight = false;
                self.flush_frame_request()
            }
            MediaNotification::FrameFailed {
                at_seconds, detail, ..
            } => {
                warn!(at_seconds, %detail, "preview frame decode failed");
                self.frame_request_in_flight = false;
                self.flush_frame_request()
            }
        }
    }

    fn request_frame(&mut self, at_seconds: f64) -> Vec<MediaRequest> {
        self.pending_frame_at = Some(at_seconds);
        self.flush_frame_request()
    }

    fn flush_frame_request(&mut self) -> Vec<MediaRequest> {
        if self.frame_request_in_flight {
            return Vec::new();
        }
        let Some(at_seconds) = self.pending_frame_at.take() else {
            return Vec::new();
        };
        let (Some(source), Some(size)) = (self.source.as_ref(), self.preview_size()) else {
            return Vec::new();
        };

        self.frame_request_in_flight = true;
        vec![MediaRequest::DecodeFrame {
            generation: self.generation,
            source: source.clone(),
            at_seconds,
            width: size.width,
            height: size.height,
        }]
    }

    fn preview_size(&self) -> Option<FrameSize> {
        let video = &self.playback.metadata()?.video;
        FrameSize::fit(video.width, video.height, self.settings.preview_max_width).ok()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}
