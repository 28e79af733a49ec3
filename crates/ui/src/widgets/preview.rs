use std::sync::Arc;

use engine::{Editor, PreviewFrame};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, column, container, image, stack, text};
use iced::{Color, ContentFit, Element, Length};

const STAGE_HEIGHT: f32 = 360.0;

/// UI-ready preview image converted from an engine frame.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub handle: image::Handle,
    pub width: u32,
    pub height: u32,
    source: Arc<[u8]>,
}

impl PreviewImage {
    /// Converts an RGBA frame into an iced image handle.
    pub fn from_frame(frame: &PreviewFrame) -> Option<Self> {
        let expected_bytes = frame.width.checked_mul(frame.height)?.checked_mul(4)? as usize;
        if frame.bytes.len() != expected_bytes {
            return None;
        }

        Some(Self {
            handle: image::Handle::from_rgba(frame.width, frame.height, frame.bytes.to_vec()),
            width: frame.width,
            height: frame.height,
            source: Arc::clone(&frame.bytes),
        })
    }

    /// Returns true when this image was built from `frame`.
    pub fn is_from(&self, frame: &PreviewFrame) -> bool {
        Arc::ptr_eq(&self.source, &frame.bytes)
    }
}

/// What the overlay layers of the video stage show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOverlay {
    pub loading: bool,
    pub error: Option<&'static str>,
    pub caption: Option<String>,
    /// `None` hides the play/pause control.
    pub transport_label: Option<&'static str>,
}

impl StageOverlay {
    pub fn from_editor(editor: &Editor) -> Self {
        let playback = editor.playback();
        let transport_label = editor.shows_transport().then(|| {
            if playback.is_playing() {
                "Pause"
            } else {
                "Play"
            }
        });

        Self {
            loading: playback.is_loading(),
            error: playback.error_message(),
            caption: editor
                .overlay_caption()
                .map(|caption| caption.text.clone()),
            transport_label,
        }
    }
}

/// Renders the video stage with its loading, error, caption and transport
/// layers.
pub fn view<'a, Message>(
    latest: Option<&PreviewImage>,
    overlay: StageOverlay,
    on_toggle: Message,
    on_try_another_url: Message,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let picture: Element<'a, Message> = match latest {
        Some(image_data) => image(image_data.handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text(""))
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
    };

    let mut layers = stack![container(picture)
        .width(Length::Fill)
        .height(Length::Fixed(STAGE_HEIGHT))
        .style(|_theme| solid(Color::BLACK))];

    if overlay.loading {
        layers = layers.push(centered(
            container(text("Loading video...")).padding(16).style(container::rounded_box),
        ));
    }

    if let Some(message) = overlay.error {
        let dialog = column![
            text(message).color(Color::from_rgb(0.9, 0.3, 0.3)),
            button("Try Another URL")
                .style(button::secondary)
                .on_press(on_try_another_url),
        ]
        .spacing(8)
        .align_x(Horizontal::Center)
        .max_width(320);
        layers = layers.push(centered(
            container(dialog).padding(16).style(container::rounded_box),
        ));
    }

    if let Some(caption) = overlay.caption {
        let banner = container(text(caption).size(20).color(Color::WHITE))
            .padding([8, 16])
            .style(|_theme| solid(Color::from_rgba(0.0, 0.0, 0.0, 0.7)));
        layers = layers.push(
            container(banner)
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Horizontal::Center)
                .align_y(Vertical::Bottom)
                .padding([64, 0]),
        );
    }

    if let Some(label) = overlay.transport_label {
        layers = layers.push(
            container(button(label).style(button::secondary).on_press(on_toggle))
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Horizontal::Center)
                .align_y(Vertical::Bottom)
                .padding(16),
        );
    }

    layers.into()
}

fn centered<'a, Message: 'a>(
    content: impl Into<Element<'a, Message>>,
) -> iced::widget::Container<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(|_theme| solid(Color::from_rgba(0.0, 0.0, 0.0, 0.5)))
}

fn solid(color: Color) -> container::Style {
    container::Style {
        background: Some(color.into()),
        ..container::Style::default()
    }
}
