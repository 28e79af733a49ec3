use std::collections::HashMap;

use engine::{Caption, CaptionId, CaptionTrack, format_duration, format_seconds};
use iced::widget::{Column, button, column, container, row, text, text_editor, text_input};
use iced::{Alignment, Element, Length};

use crate::app::Message;

pub const EMPTY_LIST_MESSAGE: &str = "No captions added yet. Add your first caption above.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeField {
    Start,
    End,
}

/// Raw text typed into caption time fields, kept until the field is reset.
pub type TimeDrafts = HashMap<(CaptionId, TimeField), String>;

/// Multi-line editor state for each caption's text.
pub type TextEditors = HashMap<CaptionId, text_editor::Content>;

/// Keeps one editor per caption, seeded from the caption text.
pub fn sync_text_editors(editors: &mut TextEditors, track: &CaptionTrack) {
    editors.retain(|id, _| track.get(id).is_some());
    for caption in track.iter() {
        editors
            .entry(caption.id.clone())
            .or_insert_with(|| text_editor::Content::with_text(&caption.text));
    }
}

/// Text of an editor without the trailing line break it reports.
pub fn editor_text(content: &text_editor::Content) -> String {
    let text = content.text();
    match text.strip_suffix('\n') {
        Some(trimmed) => trimmed.to_owned(),
        None => text,
    }
}

/// Display values for one caption in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRow {
    pub id: CaptionId,
    pub text: String,
    pub start: String,
    pub end: String,
    pub duration: String,
}

impl CaptionRow {
    pub fn new(caption: &Caption, drafts: &TimeDrafts) -> Self {
        let field = |which: TimeField, value: f64| {
            drafts
                .get(&(caption.id.clone(), which))
                .cloned()
                .unwrap_or_else(|| format_seconds(value))
        };

        Self {
            id: caption.id.clone(),
            text: caption.text.clone(),
            start: field(TimeField::Start, caption.start_time),
            end: field(TimeField::End, caption.end_time),
            duration: format_duration(caption.start_time, caption.end_time),
        }
    }
}

pub fn rows(track: &CaptionTrack, drafts: &TimeDrafts) -> Vec<CaptionRow> {
    track
        .iter()
        .map(|caption| CaptionRow::new(caption, drafts))
        .collect()
}

pub fn header(count: usize) -> String {
    format!("Captions ({count})")
}

pub fn view<'a>(
    track: &CaptionTrack,
    drafts: &TimeDrafts,
    editors: &'a TextEditors,
) -> Element<'a, Message> {
    let rows = rows(track, drafts);
    let title = text(header(rows.len())).size(20);

    if rows.is_empty() {
        return column![title, text(EMPTY_LIST_MESSAGE)].spacing(12).into();
    }

    let items = Column::with_children(
        rows.into_iter()
            .map(|caption| row_view(editors.get(&caption.id), caption)),
    )
    .spacing(12);
    column![title, items].spacing(12).into()
}

fn row_view<'a>(
    editor: Option<&'a text_editor::Content>,
    caption: CaptionRow,
) -> Element<'a, Message> {
    let id = caption.id;

    let text_field: Element<'a, Message> = match editor {
        Some(content) => {
            let id = id.clone();
            text_editor(content)
                .placeholder("Caption text")
                .height(72)
                .on_action(move |action| Message::CaptionTextEdited(id.clone(), action))
                .into()
        }
        None => text(caption.text).into(),
    };

    let start = time_field("Start (s)", &caption.start, id.clone(), TimeField::Start);
    let end = time_field("End (s)", &caption.end, id.clone(), TimeField::End);

    let footer = row![
        text(format!("Duration: {}", caption.duration)),
        container(
            button("Delete")
                .style(button::danger)
                .on_press(Message::DeletePressed(id)),
        )
        .align_right(Length::Fill),
    ]
    .align_y(Alignment::Center);

    container(column![text_field, row![start, end].spacing(12), footer].spacing(8))
        .padding(12)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn time_field<'a>(
    label: &'a str,
    value: &str,
    id: CaptionId,
    field: TimeField,
) -> Element<'a, Message> {
    let on_input = {
        let id = id.clone();
        move |input| match field {
            TimeField::Start => Message::CaptionStartChanged(id.clone(), input),
            TimeField::End => Message::CaptionEndChanged(id.clone(), input),
        }
    };
    let set_pressed = match field {
        TimeField::Start => Message::SetStartPressed(id),
        TimeField::End => Message::SetEndPressed(id),
    };

    column![
        text(label).size(12),
        row![
            text_input("0.0", value).on_input(on_input).width(96),
            button("Set").style(button::secondary).on_press(set_pressed),
        ]
        .spacing(4)
        .align_y(Alignment::Center),
    ]
    .spacing(4)
    .into()
}
