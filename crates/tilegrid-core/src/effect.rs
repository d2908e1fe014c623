//! Outputs of the interaction state machine.

use crate::error::GridError;
use crate::geometry::RenderUpdate;
use crate::model::{GridId, GridItem, ItemId, Layout};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Events reported to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    LayoutUpdated {
        grid: GridId,
        layout: Layout,
    },
    DragStarted {
        grid: GridId,
        item: GridItem,
        layout: Layout,
    },
    DragEnded {
        grid: GridId,
        item: GridItem,
        layout: Layout,
    },
    ResizeStarted {
        grid: GridId,
        item: GridItem,
        layout: Layout,
    },
    ResizeEnded {
        grid: GridId,
        item: GridItem,
        layout: Layout,
    },
    /// Pixel size of the item being resized changed.
    ItemResized {
        grid: GridId,
        item: ItemId,
        width: f64,
        height: f64,
    },
    DragEntered {
        grid: GridId,
        item: GridItem,
        source_grid: GridId,
    },
    DragExited {
        grid: GridId,
        item: GridItem,
        source_grid: GridId,
    },
    /// An item from another grid was dropped into `grid`.
    Dropped {
        grid: GridId,
        item: GridItem,
        source_grid: GridId,
        layout: Layout,
    },
    /// An item left `grid` for another grid.
    ItemRemoved {
        grid: GridId,
        item: ItemId,
        layout: Layout,
    },
    SessionCancelled {
        grid: GridId,
        reason: String,
    },
    Warning {
        grid: Option<GridId>,
        error: GridError,
    },
}

impl Notification {
    pub fn warning(grid: Option<&str>, error: GridError) -> Self {
        Notification::Warning {
            grid: grid.map(str::to_string),
            error,
        }
    }

    /// Grid the notification is about.
    pub fn grid(&self) -> Option<&str> {
        match self {
            Notification::LayoutUpdated { grid, .. }
            | Notification::DragStarted { grid, .. }
            | Notification::DragEnded { grid, .. }
            | Notification::ResizeStarted { grid, .. }
            | Notification::ResizeEnded { grid, .. }
            | Notification::ItemResized { grid, .. }
            | Notification::DragEntered { grid, .. }
            | Notification::DragExited { grid, .. }
            | Notification::Dropped { grid, .. }
            | Notification::ItemRemoved { grid, .. }
            | Notification::SessionCancelled { grid, .. } => Some(grid),
            Notification::Warning { grid, .. } => grid.as_deref(),
        }
    }
}

/// Something the dispatcher or the host has to do after a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Redraw a grid.
    Render(RenderUpdate),
    /// Store a finished layout in the registry.
    Commit { grid: GridId, layout: Layout },
    /// Scroll the grid's scroll container by `delta` pixels.
    ScrollBy { grid: GridId, delta: Vec2 },
    /// Auto-scrolling of the grid's scroll container ended.
    StopAutoScroll { grid: GridId },
    Notify(Notification),
}

impl Effect {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Effect::Notify(notification) => Some(notification),
            _ => None,
        }
    }
}
