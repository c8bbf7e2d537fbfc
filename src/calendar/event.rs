use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::helpers::format_date;

/// Fields missing from a stored record read as empty strings; an empty id
/// marks a record written before ids were mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub background_color: String,
    pub border_color: String,
}

impl CalendarEvent {
    pub fn new(
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        background_color: impl Into<String>,
        border_color: impl Into<String>,
    ) -> Self {
        Self::with_id(
            generate_id(),
            title,
            start,
            end,
            background_color,
            border_color,
        )
    }

    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        background_color: impl Into<String>,
        border_color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: start.into(),
            end: end.into(),
            background_color: background_color.into(),
            border_color: border_color.into(),
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn starts_on(&self, date: NaiveDate) -> bool {
        self.start.starts_with(&format_date(&date))
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Partial update keyed by event id. Present fields replace the stored
/// value, absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

impl EventPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = Some(color.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.background_color.is_none()
            && self.border_color.is_none()
    }

    pub fn apply_to(&self, event: &mut CalendarEvent) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(start) = &self.start {
            event.start = start.clone();
        }
        if let Some(end) = &self.end {
            event.end = end.clone();
        }
        if let Some(color) = &self.background_color {
            event.background_color = color.clone();
        }
        if let Some(color) = &self.border_color {
            event.border_color = color.clone();
        }
    }
}

impl From<CalendarEvent> for EventPatch {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            title: Some(event.title),
            start: Some(event.start),
            end: Some(event.end),
            background_color: Some(event.background_color),
            border_color: Some(event.border_color),
        }
    }
}
