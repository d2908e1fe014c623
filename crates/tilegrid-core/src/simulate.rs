//! Drag and resize simulation.
//!
//! Each call turns one pointer sample into a candidate item, resolves the
//! collisions it causes and reports the continuous pixel rectangle of the
//! item so visual feedback can follow the pointer while the layout snaps to
//! cells.

use crate::compact::resolve_collisions;
use crate::error::{GridError, GridResult};
use crate::geometry::{CellMetrics, RenderRect, pixels_to_span};
use crate::model::{GridConfig, GridItem, Layout, find_item};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// What a session is doing to its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Drag,
    Resize,
}

/// One pointer sample of an interaction. All rects are in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragTick {
    /// Pointer position when the session started.
    pub pointer_start: Point,
    /// Current pointer position.
    pub pointer_now: Point,
    /// Scroll offset accumulated since the session started.
    pub scroll_delta: Vec2,
    /// Rect of the item when the session started.
    pub item_start_rect: Rect,
    /// Rect of the grid the item is simulated in.
    pub grid_rect: Rect,
}

impl DragTick {
    /// Pointer movement since the start, including scrolling.
    pub fn delta(&self) -> Vec2 {
        self.pointer_now - self.pointer_start + self.scroll_delta
    }
}

/// Outcome of a simulated tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub layout: Layout,
    /// Unsnapped rect of the item relative to the grid.
    pub item_rect: RenderRect,
    /// Non-fatal problems met while resolving collisions.
    pub warnings: Vec<GridError>,
}

/// Run one drag or resize tick.
pub fn simulate(
    kind: InteractionKind,
    item_id: &str,
    layout: &[GridItem],
    config: &GridConfig,
    tick: &DragTick,
) -> GridResult<SimulationResult> {
    match kind {
        InteractionKind::Drag => simulate_drag(item_id, layout, config, tick),
        InteractionKind::Resize => simulate_resize(item_id, layout, config, tick),
    }
}

fn lookup<'a>(layout: &'a [GridItem], item_id: &str) -> GridResult<&'a GridItem> {
    find_item(layout, item_id).ok_or_else(|| GridError::UnknownItemId(item_id.to_string()))
}

/// Move an item by the pointer delta of `tick`.
pub fn simulate_drag(item_id: &str, layout: &[GridItem], config: &GridConfig, tick: &DragTick) -> GridResult<SimulationResult> {
    let config = config.normalized();
    let item = lookup(layout, item_id)?;
    let metrics = CellMetrics::new(layout, &config, tick.grid_rect.width(), tick.grid_rect.height())?;

    let size = tick.item_start_rect.size();
    let start = tick.item_start_rect.origin() - tick.grid_rect.origin();
    let mut left = start.x + tick.delta().x;
    let mut top = start.y + tick.delta().y;
    left = left.min(tick.grid_rect.width() - size.width).max(0.0);
    if let Some(height) = config.height {
        top = top.min(height - size.height);
    }
    top = top.max(0.0);

    let max_x = (config.cols - item.w).max(0);
    let candidate = GridItem {
        x: metrics.screen_x_to_grid_x(left).clamp(0, max_x),
        y: metrics.screen_y_to_grid_y(top).max(0),
        ..item.clone()
    };
    log::debug!("Drag {item_id} to cell ({}, {})", candidate.x, candidate.y);

    let resolution = resolve_collisions(&candidate, layout, &config);
    Ok(SimulationResult {
        layout: resolution.layout,
        item_rect: RenderRect {
            id: item.id.clone(),
            top,
            left,
            width: size.width,
            height: size.height,
        },
        warnings: resolution.warnings,
    })
}

fn span_px(span: i32, cell: f64, gap: f64) -> f64 {
    let span = f64::from(span.max(0));
    span * cell + gap * (span - 1.0).max(0.0)
}

/// Resize an item by the pointer delta of `tick`.
///
/// The spans respect the item's bounds and the remaining columns. The pixel
/// size is clamped to the same bounds.
pub fn simulate_resize(
    item_id: &str,
    layout: &[GridItem],
    config: &GridConfig,
    tick: &DragTick,
) -> GridResult<SimulationResult> {
    let config = config.normalized();
    let item = lookup(layout, item_id)?;
    let metrics = CellMetrics::new(layout, &config, tick.grid_rect.width(), tick.grid_rect.height())?;

    let origin = tick.item_start_rect.origin() - tick.grid_rect.origin();
    let delta = tick.delta();
    let max_cols = (config.cols - item.x).max(1);

    let min_width = span_px(item.min_width(), metrics.col_width, metrics.gap);
    let mut max_width = (tick.grid_rect.width() - origin.x).max(min_width);
    if let Some(max_w) = item.max_w {
        max_width = max_width.min(span_px(max_w, metrics.col_width, metrics.gap));
    }
    let width = (tick.item_start_rect.width() + delta.x).min(max_width).max(min_width);

    let min_height = span_px(item.min_height(), metrics.row_height, metrics.gap);
    let mut max_height = f64::INFINITY;
    if let Some(max_h) = item.max_h {
        max_height = span_px(max_h, metrics.row_height, metrics.gap);
    }
    if let Some(grid_height) = config.height {
        max_height = max_height.min(grid_height - origin.y);
    }
    let height = (tick.item_start_rect.height() + delta.y).min(max_height).max(min_height);

    let w = item
        .clamp_width(pixels_to_span(width, metrics.col_width, metrics.gap))
        .min(max_cols)
        .max(1);
    let h = item
        .clamp_height(pixels_to_span(height, metrics.row_height, metrics.gap))
        .max(1);
    let candidate = GridItem { w, h, ..item.clone() };
    log::debug!("Resize {item_id} to {w}x{h}");

    let resolution = resolve_collisions(&candidate, layout, &config);
    Ok(SimulationResult {
        layout: resolution.layout,
        item_rect: RenderRect {
            id: item.id.clone(),
            top: origin.y,
            left: origin.x,
            width,
            height,
        },
        warnings: resolution.warnings,
    })
}
