//! Core types shared across RoomPick: candidates and selections, widget tuning,
//! the popup view model handed to hosts, and the per-instance state machine tag.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// One selectable search result.
///
/// On the wire a candidate is `{"text": ..., "value": ..., "html": ...}`. Both `text` and
/// `value` are optional at the type level so that malformed rows coming back from a lookup
/// can be represented, logged and skipped instead of failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "text", alias = "displayText", default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "html", alias = "renderedHtml", default, skip_serializing_if = "Option::is_none")]
    pub rendered_html: Option<String>,
}

impl Candidate {
    pub fn new(display_text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display_text: Some(display_text.into()),
            value: Some(value.into()),
            rendered_html: None,
        }
    }

    /// Attach rich markup that replaces the plain text when the row is rendered.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.rendered_html = Some(html.into());
        self
    }

    /// A candidate can only be committed when it carries both text and value.
    pub fn is_complete(&self) -> bool {
        self.display_text.is_some() && self.value.is_some()
    }

    /// Case-insensitive substring match on the display text. An empty needle matches everything.
    pub fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.display_text
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(needle_lower))
    }

    /// The committed pair, if the candidate is complete.
    pub fn selection(&self) -> Option<Selection> {
        match (&self.display_text, &self.value) {
            (Some(text), Some(value)) => Some(Selection {
                display_text: text.clone(),
                value: value.clone(),
            }),
            _ => None,
        }
    }
}

/// Accepts `"42"`, `42`, `4.5` or `true` and stores it as a string; `null` becomes `None`.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// The `{displayText, value}` pair committed onto the bound input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub display_text: String,
    pub value: String,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Default cap on the visible candidate list.
pub const DEFAULT_LIMIT: usize = 100;

/// Per-instance tuning. Loaded from `.roompick.toml` by [`crate::config::load_dropdown_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownConfig {
    /// Maximum number of candidates kept from a lookup reply.
    pub limit: usize,
    /// Debounce delay applied on key-up.
    pub search_delay: Duration,
    /// How long a blur waits before hiding, so a click on a row can land first.
    pub blur_grace: Duration,
    /// Gap kept between the popup and the bottom of the viewport (overlay placement).
    pub viewport_margin: f64,
    /// Lower bound for the computed max height (overlay placement).
    pub min_max_height: f64,
    /// Fixed max height for inline placement.
    pub inline_max_height: f64,
    /// Drop lookup replies that belong to a superseded cycle.
    pub discard_stale_responses: bool,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            search_delay: Duration::from_millis(50),
            blur_grace: Duration::from_millis(200),
            viewport_margin: 50.0,
            min_max_height: 100.0,
            inline_max_height: 250.0,
            discard_stale_responses: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Popup view model
// ---------------------------------------------------------------------------

/// Absolute placement of the popup, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PopupStyle {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub max_height: f64,
}

impl PopupStyle {
    /// Inline CSS for hosts that render into a DOM.
    pub fn to_css(&self) -> String {
        format!(
            "position: absolute; left: {}px; top: {}px; width: {}px; max-height: {}px;",
            self.left, self.top, self.width, self.max_height
        )
    }
}

/// How a row should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum RowContent {
    Text(String),
    Html(String),
}

/// One rendered row. `index` points into the visible candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupRow {
    pub index: usize,
    pub value: String,
    pub content: RowContent,
}

/// Everything a host needs to draw the popup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopupView {
    pub visible: bool,
    pub style: PopupStyle,
    pub rows: Vec<PopupRow>,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where an instance sits in its search cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DropdownState {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Empty,
    AutoResolved,
    Listed,
    Committed,
}
