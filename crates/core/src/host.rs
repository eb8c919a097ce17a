//! The bound text input, as seen by the widget.

use crate::placement::{InputGeometry, Rect};

/// A text-entry control the widget is bound to.
///
/// The display value is what the user sees and types; the state value is the separate slot
/// that carries the committed candidate's opaque value (a `data-value` attribute in a DOM host).
pub trait InputHost {
    fn display_value(&self) -> String;
    fn set_display_value(&mut self, text: &str);
    fn state_value(&self) -> String;
    fn set_state_value(&mut self, value: &str);
    fn geometry(&self) -> InputGeometry;
    fn viewport_height(&self) -> f64;
    /// True when focus has moved onto the popup itself.
    fn popup_has_focus(&self) -> bool {
        false
    }
}

/// An input that only lives in memory. Used by the CLI and by tests.
#[derive(Debug, Clone)]
pub struct MemoryInput {
    pub text: String,
    pub state: String,
    pub geometry: InputGeometry,
    pub viewport_height: f64,
    pub popup_focused: bool,
}

impl Default for MemoryInput {
    fn default() -> Self {
        Self {
            text: String::new(),
            state: String::new(),
            geometry: InputGeometry::uniform(Rect::new(0.0, 0.0, 320.0, 32.0)),
            viewport_height: 768.0,
            popup_focused: false,
        }
    }
}

impl MemoryInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self { text: text.to_string(), ..Self::default() }
    }
}

impl InputHost for MemoryInput {
    fn display_value(&self) -> String {
        self.text.clone()
    }

    fn set_display_value(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn state_value(&self) -> String {
        self.state.clone()
    }

    fn set_state_value(&mut self, value: &str) {
        self.state = value.to_string();
    }

    fn geometry(&self) -> InputGeometry {
        self.geometry
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn popup_has_focus(&self) -> bool {
        self.popup_focused
    }
}
