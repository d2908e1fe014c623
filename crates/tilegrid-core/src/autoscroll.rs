//! Edge auto-scrolling of a scroll container while dragging.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default size of the edge band, as a fraction of the container size.
pub const DEFAULT_SCROLL_PROXIMITY: f64 = 0.05;
/// Default pixels scrolled per frame.
pub const DEFAULT_SCROLL_SPEED: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalScroll {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalScroll {
    Left,
    Right,
}

/// Direction the container should scroll in, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollDirection {
    pub vertical: Option<VerticalScroll>,
    pub horizontal: Option<HorizontalScroll>,
}

impl ScrollDirection {
    pub const NONE: ScrollDirection = ScrollDirection {
        vertical: None,
        horizontal: None,
    };

    pub fn is_none(&self) -> bool {
        self.vertical.is_none() && self.horizontal.is_none()
    }

    /// Scroll offset change for one frame.
    pub fn step(&self, speed: f64) -> Vec2 {
        let dx = match self.horizontal {
            Some(HorizontalScroll::Left) => -speed,
            Some(HorizontalScroll::Right) => speed,
            None => 0.0,
        };
        let dy = match self.vertical {
            Some(VerticalScroll::Up) => -speed,
            Some(VerticalScroll::Down) => speed,
            None => 0.0,
        };
        Vec2::new(dx, dy)
    }
}

/// Direction to scroll `container` for a pointer at `pointer`.
///
/// The pointer must be near the container (within the edge band around it);
/// it then scrolls towards any edge whose band it is in.
pub fn scroll_direction(container: Rect, pointer: Point, proximity: f64) -> ScrollDirection {
    let band_y = container.height() * proximity;
    let band_x = container.width() * proximity;
    let near = container.inflate(band_x, band_y);
    if !near.contains(pointer) {
        return ScrollDirection::NONE;
    }

    let vertical = if (pointer.y - container.y0).abs() <= band_y {
        Some(VerticalScroll::Up)
    } else if (pointer.y - container.y1).abs() <= band_y {
        Some(VerticalScroll::Down)
    } else {
        None
    };
    let horizontal = if (pointer.x - container.x0).abs() <= band_x {
        Some(HorizontalScroll::Left)
    } else if (pointer.x - container.x1).abs() <= band_x {
        Some(HorizontalScroll::Right)
    } else {
        None
    };
    ScrollDirection { vertical, horizontal }
}
