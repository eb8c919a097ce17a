//! Popup geometry.
//!
//! `Overlay` popups live at the document root and are positioned from the input's bounding
//! box, with the max height clamped to what is left of the viewport. `InsertAfter` popups sit
//! right after the input in the flow and use its offset geometry with a fixed max height.

use serde::Serialize;

use crate::types::{DropdownConfig, PopupStyle};

/// Where the popup is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// Inserted immediately after the input element.
    InsertAfter,
    /// Appended to the document root and positioned absolutely.
    #[default]
    Overlay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// The two views of the input's geometry a host can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InputGeometry {
    /// Viewport-relative bounding box.
    pub bounding: Rect,
    /// Offset box relative to the offset parent.
    pub offset: Rect,
}

impl InputGeometry {
    /// Same rect for both views; fine for hosts without an offset parent.
    pub fn uniform(rect: Rect) -> Self {
        Self { bounding: rect, offset: rect }
    }

    /// Geometry of an input laid out inside a positioned container. Both rects are
    /// viewport-relative; `offset` ends up relative to the container's corner, like
    /// `offsetLeft`/`offsetTop`.
    pub fn within(input: Rect, container: Rect) -> Self {
        Self {
            bounding: input,
            offset: Rect::new(input.x - container.x, input.y - container.y, input.width, input.height),
        }
    }
}

pub fn popup_style(
    placement: Placement,
    geometry: &InputGeometry,
    viewport_height: f64,
    config: &DropdownConfig,
) -> PopupStyle {
    match placement {
        Placement::InsertAfter => {
            let r = geometry.offset;
            PopupStyle {
                left: r.x,
                top: r.bottom(),
                width: r.width,
                max_height: config.inline_max_height,
            }
        }
        Placement::Overlay => {
            let r = geometry.bounding;
            let remaining = viewport_height - r.bottom() - config.viewport_margin;
            PopupStyle {
                left: r.x,
                top: r.bottom(),
                width: r.width,
                max_height: remaining.max(config.min_max_height),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> InputGeometry {
        InputGeometry {
            bounding: Rect::new(40.0, 100.0, 300.0, 30.0),
            offset: Rect::new(8.0, 12.0, 280.0, 28.0),
        }
    }

    #[test]
    fn overlay_uses_remaining_viewport() {
        let style = popup_style(Placement::Overlay, &geometry(), 800.0, &DropdownConfig::default());
        assert_eq!(style.left, 40.0);
        assert_eq!(style.top, 130.0);
        assert_eq!(style.width, 300.0);
        // 800 - 130 - 50
        assert_eq!(style.max_height, 620.0);
    }

    #[test]
    fn overlay_max_height_has_floor() {
        let style = popup_style(Placement::Overlay, &geometry(), 200.0, &DropdownConfig::default());
        assert_eq!(style.max_height, 100.0);
    }

    #[test]
    fn insert_after_uses_offset_box_and_fixed_height() {
        let style =
            popup_style(Placement::InsertAfter, &geometry(), 200.0, &DropdownConfig::default());
        assert_eq!(style.left, 8.0);
        assert_eq!(style.top, 40.0);
        assert_eq!(style.width, 280.0);
        assert_eq!(style.max_height, 250.0);
    }

    #[test]
    fn input_below_label_drops_popup_under_input() {
        // Field at (40, 80); label plus gap push the input 19px down.
        let field = Rect::new(40.0, 80.0, 320.0, 53.0);
        let input = Rect::new(40.0, 99.0, 320.0, 34.0);
        let geometry = InputGeometry::within(input, field);
        assert_eq!(geometry.offset, Rect::new(0.0, 19.0, 320.0, 34.0));

        let style =
            popup_style(Placement::InsertAfter, &geometry, 700.0, &DropdownConfig::default());
        assert_eq!(style.left, 0.0);
        assert_eq!(style.top, 53.0);
        assert_eq!(style.width, 320.0);
    }
}
