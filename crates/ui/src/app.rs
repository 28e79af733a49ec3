use std::sync::mpsc::TrySendError;
use std::time::Instant;

use engine::{
    CaptionId, Command, Editor, EditorSettings, EngineError, MediaRequest, format_time,
};
use iced::widget::{
    button, column, container, row, scrollable, slider, text, text_editor, text_input,
};
use iced::{Element, Length, Subscription, Task};
use tracing::{debug, warn};

use crate::bridge::{BridgeEvent, MediaRequestSender, media_subscription};
use crate::widgets::caption_list::{
    self, TextEditors, TimeDrafts, TimeField, editor_text, sync_text_editors,
};
use crate::widgets::preview::{self, PreviewImage, StageOverlay};

/// UI messages handled by the iced app update loop.
#[derive(Debug, Clone)]
pub enum Message {
    UrlChanged(String),
    SamplePicked(usize),
    LoadPressed,
    ChangeVideoPressed,
    TryAnotherUrlPressed,
    PlayPausePressed,
    Tick(Instant),
    Scrubbed(f64),
    DraftEdited(text_editor::Action),
    AddCaptionPressed,
    CaptionTextEdited(CaptionId, text_editor::Action),
    CaptionStartChanged(CaptionId, String),
    CaptionEndChanged(CaptionId, String),
    SetStartPressed(CaptionId),
    SetEndPressed(CaptionId),
    DeletePressed(CaptionId),
    Bridge(BridgeEvent),
}

/// Root UI state wrapping the editor and its media worker link.
pub struct AppState {
    editor: Editor,
    media_tx: Option<MediaRequestSender>,
    /// Requests produced before the worker was ready or while its queue was full.
    backlog: Vec<MediaRequest>,
    last_tick: Option<Instant>,
    preview: Option<PreviewImage>,
    draft_editor: text_editor::Content,
    text_editors: TextEditors,
    time_drafts: TimeDrafts,
    status: String,
}

impl AppState {
    /// Boots the app with settings from `CAPEDIT_SETTINGS`, falling back to
    /// defaults when the file cannot be read.
    pub fn boot() -> (Self, Task<Message>) {
        let settings = EditorSettings::from_env().unwrap_or_else(|error| {
            warn!(%error, "using default settings");
            EditorSettings::default()
        });
        (Self::with_settings(settings), Task::none())
    }

    fn with_settings(settings: EditorSettings) -> Self {
        Self {
            editor: Editor::new(settings),
            media_tx: None,
            backlog: Vec::new(),
            last_tick: None,
            preview: None,
            draft_editor: text_editor::Content::new(),
            text_editors: TextEditors::new(),
            time_drafts: TimeDrafts::new(),
            status: String::from("starting media worker"),
        }
    }

    /// Handles one UI message.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UrlChanged(url) => self.apply(Command::UrlInputChanged(url)),
            Message::SamplePicked(index) => self.apply(Command::SampleSelected(index)),
            Message::LoadPressed => self.apply(Command::LoadVideo),
            Message::ChangeVideoPressed => self.apply(Command::ChangeVideo),
            Message::TryAnotherUrlPressed => self.apply(Command::TryAnotherUrl),
            Message::PlayPausePressed => {
                self.apply(Command::TogglePlayback);
                self.last_tick = Some(Instant::now());
            }
            Message::Tick(now) => {
                let elapsed_seconds = self
                    .last_tick
                    .map(|last| now.saturating_duration_since(last).as_secs_f64())
                    .unwrap_or(0.0);
                self.last_tick = Some(now);
                self.apply(Command::AdvanceClock { elapsed_seconds });
            }
            Message::Scrubbed(seconds) => self.apply(Command::Seek { seconds }),
            Message::DraftEdited(action) => {
                let is_edit = action.is_edit();
                self.draft_editor.perform(action);
                if is_edit {
                    self.apply(Command::DraftChanged(editor_text(&self.draft_editor)));
                }
            }
            Message::AddCaptionPressed => {
                self.apply(Command::AddCaption);
                if self.editor.draft().is_empty() {
                    self.draft_editor = text_editor::Content::new();
                }
            }
            Message::CaptionTextEdited(id, action) => {
                let edited = self.text_editors.get_mut(&id).and_then(|content| {
                    let is_edit = action.is_edit();
                    content.perform(action);
                    is_edit.then(|| editor_text(content))
                });
                if let Some(text) = edited {
                    self.apply(Command::EditCaptionText { id, text });
                }
            }
            Message::CaptionStartChanged(id, input) => {
                self.time_drafts
                    .insert((id.clone(), TimeField::Start), input.clone());
                self.apply(Command::EditCaptionStart { id, input });
            }
            Message::CaptionEndChanged(id, input) => {
                self.time_drafts
                    .insert((id.clone(), TimeField::End), input.clone());
                self.apply(Command::EditCaptionEnd { id, input });
            }
            Message::SetStartPressed(id) => {
                self.time_drafts.remove(&(id.clone(), TimeField::Start));
                self.apply(Command::SetStartToCurrentTime { id });
            }
            Message::SetEndPressed(id) => {
                self.time_drafts.remove(&(id.clone(), TimeField::End));
                self.apply(Command::SetEndToCurrentTime { id });
            }
            Message::DeletePressed(id) => {
                self.time_drafts.retain(|(draft_id, _), _| draft_id != &id);
                self.apply(Command::DeleteCaption { id });
            }
            Message::Bridge(BridgeEvent::Ready(sender)) => {
                self.media_tx = Some(sender);
                self.status = String::from("media worker ready");
                self.flush_backlog();
            }
            Message::Bridge(BridgeEvent::Notification(notification)) => {
                self.apply(Command::Media(notification));
            }
            Message::Bridge(BridgeEvent::Disconnected) => {
                self.status = String::from("media worker stopped");
                self.media_tx = None;
            }
        }

        if !self.editor.playback().is_playing() {
            self.last_tick = None;
        }
        self.sync_preview();
        sync_text_editors(&mut self.text_editors, self.editor.captions());
        Task::none()
    }

    fn apply(&mut self, command: Command) {
        match self.editor.handle_command(command) {
            Ok(requests) => {
                self.backlog.extend(requests);
                self.flush_backlog();
            }
            Err(error @ EngineError::InvalidTimeInput { .. }) => {
                debug!(%error, "time field left unchanged");
                self.status = error.to_string();
            }
            Err(error) => {
                warn!(%error, "command rejected");
                self.status = error.to_string();
            }
        }
    }

    fn flush_backlog(&mut self) {
        let Some(sender) = &self.media_tx else {
            return;
        };

        let mut pending = std::mem::take(&mut self.backlog).into_iter();
        while let Some(request) = pending.next() {
            match sender.try_send(request) {
                Ok(()) => {}
                Err(TrySendError::Full(request)) => {
                    self.status = String::from("media request queue is full");
                    self.backlog.push(request);
                    self.backlog.extend(pending);
                    return;
                }
                Err(TrySendError::Disconnected(request)) => {
                    self.status = String::from("media request channel closed");
                    self.media_tx = None;
                    self.backlog.push(request);
                    self.backlog.extend(pending);
                    return;
                }
            }
        }
    }

    fn sync_preview(&mut self) {
        match self.editor.preview_frame() {
            Some(frame) => {
                let current = self
                    .preview
                    .as_ref()
                    .is_some_and(|image| image.is_from(frame));
                if !current {
                    self.preview = PreviewImage::from_frame(frame);
                }
            }
            None => self.preview = None,
        }
    }

    /// Renders the UI tree.
    pub fn view(&self) -> Element<'_, Message> {
        let body = row![self.video_pane(), self.caption_pane()]
            .spacing(24)
            .height(Length::Fill);

        column![
            text("Video Caption Editor").size(28),
            body,
            text(format!("Status: {}", self.status)).size(12),
        ]
        .spacing(16)
        .padding(16)
        .into()
    }

    fn video_pane(&self) -> Element<'_, Message> {
        let content: Element<'_, Message> = if self.editor.show_url_input() {
            self.url_card()
        } else {
            self.player()
        };

        container(content).width(Length::FillPortion(1)).into()
    }

    fn url_card(&self) -> Element<'_, Message> {
        let samples = self
            .editor
            .samples()
            .iter()
            .enumerate()
            .fold(column![text("Sample videos:").size(12)], |list, (index, sample)| {
                list.push(
                    button(text(sample.title.as_str()))
                        .style(button::text)
                        .on_press(Message::SamplePicked(index)),
                )
            })
            .spacing(4);

        let card = column![
            text("Enter Video URL").size(20),
            text_input("https://example.com/video.mp4", self.editor.video_url())
                .on_input(Message::UrlChanged)
                .on_submit_maybe(self.editor.can_load_video().then_some(Message::LoadPressed)),
            samples,
            button("Load Video")
                .on_press_maybe(self.editor.can_load_video().then_some(Message::LoadPressed)),
        ]
        .spacing(12);

        container(card)
            .padding(16)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    }

    fn player(&self) -> Element<'_, Message> {
        let playback = self.editor.playback();
        let stage = preview::view(
            self.preview.as_ref(),
            StageOverlay::from_editor(&self.editor),
            Message::PlayPausePressed,
            Message::TryAnotherUrlPressed,
        );

        let mut player = column![
            stage,
            text(format!(
                "Current Time: {}",
                format_time(self.editor.current_time())
            )),
        ]
        .spacing(12);

        if let Some(duration) = playback.duration().filter(|_| self.editor.shows_transport()) {
            player = player.push(
                slider(0.0..=duration, self.editor.current_time(), Message::Scrubbed).step(0.1),
            );
        }

        player
            .push(
                button("Change Video")
                    .style(button::secondary)
                    .on_press(Message::ChangeVideoPressed),
            )
            .into()
    }

    fn caption_pane(&self) -> Element<'_, Message> {
        let add_card = column![
            text("Add New Caption").size(20),
            text_editor(&self.draft_editor)
                .placeholder("Enter caption text...")
                .height(96)
                .on_action(Message::DraftEdited),
            text(format!(
                "Caption will start at: {}",
                format_time(self.editor.current_time())
            ))
            .size(12),
            button("Add Caption at Current Time").on_press_maybe(
                self.editor
                    .can_add_caption()
                    .then_some(Message::AddCaptionPressed)
            ),
        ]
        .spacing(12);

        let pane = column![
            container(add_card)
                .padding(16)
                .width(Length::Fill)
                .style(container::rounded_box),
            caption_list::view(self.editor.captions(), &self.time_drafts, &self.text_editors),
        ]
        .spacing(16);

        scrollable(pane).width(Length::FillPortion(1)).into()
    }

    /// Subscribes to media worker events, plus clock ticks while playing.
    pub fn subscription(&self) -> Subscription<Message> {
        let media = media_subscription().map(Message::Bridge);
        if self.editor.playback().is_playing() {
            let tick = iced::time::every(self.editor.settings().tick_interval()).map(Message::Tick);
            Subscription::batch([media, tick])
        } else {
            media
        }
    }

    #[cfg(test)]
    fn from_sender_for_test(media_tx: MediaRequestSender) -> Self {
        let mut app = Self::with_settings(EditorSettings::default());
        app.media_tx = Some(media_tx);
        app.status = String::from("idle");
        app
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::sync::mpsc::{Receiver, TryRecvError};
    use std::time::{Duration, Instant};

    use engine::{
        EditorSettings, MediaMetadata, MediaNotification, MediaRequest, PreviewFrame,
        VideoTrackInfo,
    };

    use iced::widget::text_editor::{Action, Edit};

    use crate::bridge::BridgeEvent;
    use crate::widgets::caption_list::{TimeField, editor_text};

    use super::{AppState, Message};

    const URL: &str = "https://example.com/video.mp4";

    fn loaded_app() -> (AppState, Receiver<MediaRequest>) {
        let (media_tx, media_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(media_tx);

        let _ = app.update(Message::UrlChanged(URL.to_owned()));
        let _ = app.update(Message::LoadPressed);
        let Ok(MediaRequest::Load { generation, .. }) = media_rx.recv() else {
            panic!("expected load request");
        };
        let _ = app.update(Message::Bridge(BridgeEvent::Notification(
            MediaNotification::Loaded {
                generation,
                metadata: MediaMetadata {
                    duration_seconds: Some(60.0),
                    video: VideoTrackInfo {
                        width: 320,
                        height: 180,
                        codec: None,
                    },
                },
            },
        )));
        let Ok(MediaRequest::DecodeFrame { at_seconds, .. }) = media_rx.recv() else {
            panic!("expected first frame request");
        };
        let _ = app.update(Message::Bridge(BridgeEvent::Notification(
            MediaNotification::FrameReady {
                generation,
                at_seconds,
                frame: PreviewFrame {
                    width: 2,
                    height: 2,
                    bytes: Arc::from(vec![0_u8; 16]),
                },
            },
        )));
        (app, media_rx)
    }

    fn paste(text: &str) -> Action {
        Action::Edit(Edit::Paste(Arc::new(text.to_owned())))
    }

    fn add_caption(app: &mut AppState, text: &str) -> engine::CaptionId {
        let _ = app.update(Message::DraftEdited(paste(text)));
        let _ = app.update(Message::AddCaptionPressed);
        app.editor
            .captions()
            .as_slice()
            .last()
            .expect("caption added")
            .id
            .clone()
    }

    #[test]
    fn load_button_dispatches_load_request() {
        let (media_tx, media_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(media_tx);

        let _ = app.update(Message::UrlChanged(URL.to_owned()));
        let _ = app.update(Message::LoadPressed);

        let request = media_rx.recv().expect("load request");
        assert!(matches!(request, MediaRequest::Load { ref source, .. } if source.as_str() == URL));
        assert!(!app.editor.show_url_input());
    }

    #[test]
    fn requests_wait_in_backlog_until_worker_is_ready() {
        let mut app = AppState::with_settings(EditorSettings::default());
        let _ = app.update(Message::UrlChanged(URL.to_owned()));
        let _ = app.update(Message::LoadPressed);
        assert_eq!(app.backlog.len(), 1);

        let (media_tx, media_rx) = mpsc::sync_channel(8);
        let _ = app.update(Message::Bridge(BridgeEvent::Ready(media_tx)));

        assert!(app.backlog.is_empty());
        assert!(matches!(
            media_rx.recv().expect("load request"),
            MediaRequest::Load { .. }
        ));
    }

    #[test]
    fn decoded_frame_becomes_preview_image() {
        let (app, _media_rx) = loaded_app();

        let preview = app.preview.as_ref().expect("preview image");
        assert_eq!((preview.width, preview.height), (2, 2));
    }

    #[test]
    fn ticks_advance_clock_only_while_playing() {
        let (mut app, _media_rx) = loaded_app();
        let start = Instant::now();

        let _ = app.update(Message::Tick(start + Duration::from_secs(5)));
        assert_eq!(app.editor.current_time(), 0.0);

        let _ = app.update(Message::PlayPausePressed);
        assert!(app.editor.playback().is_playing());
        let resumed = Instant::now();
        let _ = app.update(Message::Tick(resumed));
        let _ = app.update(Message::Tick(resumed + Duration::from_secs(2)));

        assert!((app.editor.current_time() - 2.0).abs() < 0.1);

        let _ = app.update(Message::PlayPausePressed);
        assert!(app.last_tick.is_none());
    }

    #[test]
    fn invalid_time_input_keeps_typed_text_and_caption_value() {
        let (mut app, _media_rx) = loaded_app();
        let id = add_caption(&mut app, "hello");

        let _ = app.update(Message::CaptionStartChanged(id.clone(), "abc".to_owned()));

        assert_eq!(
            app.time_drafts
                .get(&(id.clone(), TimeField::Start))
                .map(String::as_str),
            Some("abc")
        );
        assert_eq!(app.editor.captions().get(&id).expect("caption").start_time, 0.0);
        assert!(app.status.contains("abc"));
    }

    #[test]
    fn set_to_current_time_discards_typed_draft() {
        let (mut app, _media_rx) = loaded_app();
        let id = add_caption(&mut app, "hello");
        let _ = app.update(Message::CaptionEndChanged(id.clone(), "9.".to_owned()));
        let _ = app.update(Message::Scrubbed(12.0));

        let _ = app.update(Message::SetEndPressed(id.clone()));

        assert!(!app.time_drafts.contains_key(&(id.clone(), TimeField::End)));
        assert_eq!(app.editor.captions().get(&id).expect("caption").end_time, 12.0);
    }

    #[test]
    fn scrubbing_coalesces_frame_requests() {
        let (mut app, media_rx) = loaded_app();

        let _ = app.update(Message::Scrubbed(10.0));
        let _ = app.update(Message::Scrubbed(20.0));
        let _ = app.update(Message::Scrubbed(30.0));

        let first = media_rx.recv().expect("first decode request");
        assert!(matches!(first, MediaRequest::DecodeFrame { at_seconds, .. } if at_seconds == 10.0));
        assert!(matches!(media_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn multi_line_draft_becomes_caption_and_resets_editor() {
        let (mut app, _media_rx) = loaded_app();

        let id = add_caption(&mut app, "first line\nsecond line");

        let caption = app.editor.captions().get(&id).expect("caption");
        assert_eq!(caption.text, "first line\nsecond line");
        assert_eq!(app.editor.draft(), "");
        assert_eq!(editor_text(&app.draft_editor), "");
        assert_eq!(
            editor_text(&app.text_editors[&id]),
            "first line\nsecond line"
        );
    }

    #[test]
    fn caption_editor_actions_update_caption_text() {
        let (mut app, _media_rx) = loaded_app();
        let id = add_caption(&mut app, "hello");

        let _ = app.update(Message::CaptionTextEdited(id.clone(), Action::SelectAll));
        assert_eq!(app.editor.captions().get(&id).expect("caption").text, "hello");

        let _ = app.update(Message::CaptionTextEdited(id.clone(), paste("bye\nnow")));

        assert_eq!(
            app.editor.captions().get(&id).expect("caption").text,
            "bye\nnow"
        );
    }

    #[test]
    fn deleting_caption_drops_its_drafts() {
        let (mut app, _media_rx) = loaded_app();
        let id = add_caption(&mut app, "bye");
        let _ = app.update(Message::CaptionStartChanged(id.clone(), "x".to_owned()));

        let _ = app.update(Message::DeletePressed(id));

        assert!(app.time_drafts.is_empty());
        assert!(app.text_editors.is_empty());
        assert!(app.editor.captions().is_empty());
    }
}
