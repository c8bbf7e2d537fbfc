use serde::{Deserialize, Serialize};

use crate::calendar::{PopupElement, Position, Size, Viewport};

/// Offsets used when placing a popup next to the point that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopupLayout {
    /// Minimum distance kept from the viewport edges.
    pub padding: f64,
    pub gap_below: f64,
    pub gap_above: f64,
}

impl Default for PopupLayout {
    fn default() -> Self {
        Self {
            padding: 8.0,
            gap_below: 16.0,
            gap_above: 20.0,
        }
    }
}

impl PopupLayout {
    /// Centers the popup horizontally on `anchor` and puts it below the
    /// anchor, flipping above when the bottom edge would overflow.
    ///
    /// Horizontal overflow is clamped right edge first, then left edge, so
    /// a popup wider than the viewport ends up pinned to the left padding.
    /// The flipped position is not clamped against the top edge.
    pub fn place(&self, size: Size, anchor: Position, viewport: Viewport) -> Position {
        let mut x = anchor.x - size.width / 2.0;
        let mut y = anchor.y + self.gap_below;

        if y + size.height + self.padding > viewport.height {
            y = anchor.y - size.height - self.gap_above;
        }

        if x + size.width > viewport.width - self.padding {
            x = viewport.width - size.width - self.padding;
        }
        if x < self.padding {
            x = self.padding;
        }

        Position { x, y }
    }
}

/// Measures `popup` and hands its clamped position to `callback`.
///
/// Does nothing when there is no popup yet, e.g. before its first render.
pub fn adjust_position<P, F>(popup: Option<&P>, anchor: Position, viewport: Viewport, callback: F)
where
    P: PopupElement + ?Sized,
    F: FnOnce(Position),
{
    adjust_position_with(&PopupLayout::default(), popup, anchor, viewport, callback);
}

pub fn adjust_position_with<P, F>(
    layout: &PopupLayout,
    popup: Option<&P>,
    anchor: Position,
    viewport: Viewport,
    callback: F,
) where
    P: PopupElement + ?Sized,
    F: FnOnce(Position),
{
    let Some(popup) = popup else {
        tracing::trace!("Popup not rendered yet, skipping placement");
        return;
    };

    let size = popup.bounding_size();
    let position = layout.place(size, anchor, viewport);
    tracing::trace!(?size, ?anchor, ?position, "Placed popup");
    callback(position);
}
