//! [`InputHost`] backed by component signals.

use dioxus::prelude::*;
use roompick_core::{InputGeometry, InputHost};

/// The `<input>` element of a picker, mirrored into signals so the rendered field follows
/// whatever the dropdown writes.
#[derive(Clone, Copy)]
pub struct SignalInput {
    pub text: Signal<String>,
    pub state: Signal<String>,
    pub geometry: Signal<InputGeometry>,
    pub popup_hovered: Signal<bool>,
    pub viewport_height: f64,
}

impl InputHost for SignalInput {
    fn display_value(&self) -> String {
        self.text.peek().clone()
    }

    fn set_display_value(&mut self, text: &str) {
        self.text.set(text.to_string());
    }

    fn state_value(&self) -> String {
        self.state.peek().clone()
    }

    fn set_state_value(&mut self, value: &str) {
        self.state.set(value.to_string());
    }

    fn geometry(&self) -> InputGeometry {
        *self.geometry.peek()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    // The webview blurs the input on mousedown, before the row's click lands.
    fn popup_has_focus(&self) -> bool {
        *self.popup_hovered.peek()
    }
}
