//! Surface abstraction and render-update application.

use kurbo::Rect;
use peniko::Color;
use std::collections::BTreeMap;
use thiserror::Error;
use tilegrid_core::{GridId, ItemId, RenderRect, RenderUpdate};

/// Errors that can occur while presenting a render update.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Grid has no surface: {0}")]
    UnknownGrid(GridId),
    #[error("Invalid rect for item {id}: {rect:?}")]
    InvalidRect { id: ItemId, rect: Rect },
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// How an item is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStyle {
    /// Sitting in its cell.
    Resting,
    /// Following the pointer; hosts usually raise it and skip transitions.
    Dragging,
}

/// Context for presenting one render update.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// The update to present.
    pub update: &'a RenderUpdate,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Round resting rects to device pixels.
    pub snap_to_pixels: bool,
    /// Fill of the drop placeholder.
    pub placeholder_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(update: &'a RenderUpdate) -> Self {
        Self {
            update,
            scale_factor: 1.0,
            snap_to_pixels: true,
            placeholder_color: Color::from_rgba8(59, 130, 246, 64), // Translucent blue
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Enable or disable device-pixel snapping.
    pub fn with_pixel_snapping(mut self, enabled: bool) -> Self {
        self.snap_to_pixels = enabled;
        self
    }

    /// Set the placeholder fill.
    pub fn with_placeholder_color(mut self, color: Color) -> Self {
        self.placeholder_color = color;
        self
    }

    fn resting_rect(&self, rect: &RenderRect) -> SurfaceResult<Rect> {
        let out = checked_rect(rect)?;
        Ok(if self.snap_to_pixels {
            snap_rect(out, self.scale_factor)
        } else {
            out
        })
    }
}

/// A host surface that displays the items of one or more grids.
///
/// Calls for one update arrive as `begin_frame`, any number of
/// `place_item`, one `set_placeholder`, then `end_frame`. Items not placed
/// between `begin_frame` and `end_frame` are no longer part of the grid.
pub trait Surface {
    /// Start presenting a grid at the given container height.
    fn begin_frame(&mut self, grid: &str, container_height: f64) -> SurfaceResult<()>;

    /// Position an item.
    fn place_item(&mut self, grid: &str, id: &str, rect: Rect, style: ItemStyle) -> SurfaceResult<()>;

    /// Show or hide the drop placeholder.
    fn set_placeholder(&mut self, grid: &str, placeholder: Option<(Rect, Color)>) -> SurfaceResult<()>;

    /// Finish presenting a grid.
    fn end_frame(&mut self, _grid: &str) -> SurfaceResult<()> {
        Ok(())
    }
}

/// Round a rect's edges to device pixels.
pub fn snap_rect(rect: Rect, scale_factor: f64) -> Rect {
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return rect;
    }
    let snap = |v: f64| (v * scale_factor).round() / scale_factor;
    Rect::new(snap(rect.x0), snap(rect.y0), snap(rect.x1), snap(rect.y1))
}

fn checked_rect(rect: &RenderRect) -> SurfaceResult<Rect> {
    let out = rect.to_rect();
    let finite = [rect.top, rect.left, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || rect.width < 0.0 || rect.height < 0.0 {
        return Err(SurfaceError::InvalidRect {
            id: rect.id.clone(),
            rect: out,
        });
    }
    Ok(out)
}

/// Present a render update on a surface.
///
/// Resting items are snapped to device pixels when enabled; the dragged item
/// keeps its continuous rect so it tracks the pointer smoothly.
pub fn apply_update(surface: &mut dyn Surface, ctx: &RenderContext) -> SurfaceResult<()> {
    let update = ctx.update;
    let grid = update.grid.as_str();
    log::debug!(
        "Presenting grid {grid}: {} items, height {}",
        update.rects.len(),
        update.container_height
    );

    let resting = update
        .rects
        .values()
        .map(|rect| ctx.resting_rect(rect).map(|out| (rect.id.as_str(), out)))
        .collect::<SurfaceResult<Vec<_>>>()?;
    let placeholder = match &update.placeholder {
        Some(rect) => Some((ctx.resting_rect(rect)?, ctx.placeholder_color)),
        None => None,
    };
    let dragged = match &update.dragged {
        Some(rect) => Some((rect.id.as_str(), checked_rect(rect)?)),
        None => None,
    };

    surface.begin_frame(grid, update.container_height)?;
    for (id, rect) in resting {
        surface.place_item(grid, id, rect, ItemStyle::Resting)?;
    }
    surface.set_placeholder(grid, placeholder)?;
    if let Some((id, rect)) = dragged {
        surface.place_item(grid, id, rect, ItemStyle::Dragging)?;
    }
    surface.end_frame(grid)
}

/// An item as last placed on a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedItem {
    pub rect: Rect,
    pub style: ItemStyle,
}

/// What a [`RecordingSurface`] currently shows for one grid.
#[derive(Debug, Clone, Default)]
pub struct GridFrame {
    pub container_height: f64,
    pub items: BTreeMap<ItemId, PlacedItem>,
    pub placeholder: Option<(Rect, Color)>,
    /// Number of completed frames.
    pub frames: usize,
}

/// In-memory surface that keeps the latest frame of every grid.
///
/// Used by headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    grids: BTreeMap<GridId, GridFrame>,
    open: Option<GridId>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest frame of a grid.
    pub fn frame(&self, grid: &str) -> Option<&GridFrame> {
        self.grids.get(grid)
    }

    /// Iterate all grids in id order.
    pub fn frames(&self) -> impl Iterator<Item = (&GridId, &GridFrame)> {
        self.grids.iter()
    }

    /// Drop everything shown for a grid.
    pub fn forget(&mut self, grid: &str) -> bool {
        self.grids.remove(grid).is_some()
    }

    fn open_frame(&mut self, grid: &str) -> SurfaceResult<&mut GridFrame> {
        if self.open.as_deref() != Some(grid) {
            return Err(SurfaceError::Surface(format!("No open frame for grid {grid}")));
        }
        self.grids
            .get_mut(grid)
            .ok_or_else(|| SurfaceError::UnknownGrid(grid.to_string()))
    }
}

impl Surface for RecordingSurface {
    fn begin_frame(&mut self, grid: &str, container_height: f64) -> SurfaceResult<()> {
        if let Some(open) = &self.open {
            return Err(SurfaceError::Surface(format!("Frame for grid {open} still open")));
        }
        let frame = self.grids.entry(grid.to_string()).or_default();
        frame.container_height = container_height;
        frame.items.clear();
        frame.placeholder = None;
        self.open = Some(grid.to_string());
        Ok(())
    }

    fn place_item(&mut self, grid: &str, id: &str, rect: Rect, style: ItemStyle) -> SurfaceResult<()> {
        self.open_frame(grid)?
            .items
            .insert(id.to_string(), PlacedItem { rect, style });
        Ok(())
    }

    fn set_placeholder(&mut self, grid: &str, placeholder: Option<(Rect, Color)>) -> SurfaceResult<()> {
        self.open_frame(grid)?.placeholder = placeholder;
        Ok(())
    }

    fn end_frame(&mut self, grid: &str) -> SurfaceResult<()> {
        self.open_frame(grid)?.frames += 1;
        self.open = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilegrid_core::RenderRects;

    fn rect(id: &str, left: f64, top: f64, width: f64, height: f64) -> RenderRect {
        RenderRect {
            id: id.into(),
            top,
            left,
            width,
            height,
        }
    }

    fn update(rects: Vec<RenderRect>) -> RenderUpdate {
        let rects: RenderRects = rects.into_iter().map(|r| (r.id.clone(), r)).collect();
        RenderUpdate {
            grid: "g".into(),
            rects,
            container_height: 300.0,
            placeholder: None,
            dragged: None,
        }
    }

    #[test]
    fn test_apply_places_every_item() {
        let update = update(vec![rect("a", 0.0, 0.0, 100.0, 100.0), rect("b", 110.0, 0.0, 100.0, 100.0)]);
        let mut surface = RecordingSurface::new();
        apply_update(&mut surface, &RenderContext::new(&update)).unwrap();

        let frame = surface.frame("g").unwrap();
        assert_eq!(frame.container_height, 300.0);
        assert_eq!(frame.frames, 1);
        assert_eq!(frame.items["b"].rect, Rect::new(110.0, 0.0, 210.0, 100.0));
        assert_eq!(frame.items["b"].style, ItemStyle::Resting);
        assert!(frame.placeholder.is_none());
    }

    #[test]
    fn test_new_frame_drops_stale_items() {
        let mut surface = RecordingSurface::new();
        let first = update(vec![rect("a", 0.0, 0.0, 10.0, 10.0), rect("b", 10.0, 0.0, 10.0, 10.0)]);
        apply_update(&mut surface, &RenderContext::new(&first)).unwrap();
        let second = update(vec![rect("a", 0.0, 0.0, 10.0, 10.0)]);
        apply_update(&mut surface, &RenderContext::new(&second)).unwrap();

        let frame = surface.frame("g").unwrap();
        assert_eq!(frame.frames, 2);
        assert!(!frame.items.contains_key("b"));
    }

    #[test]
    fn test_drag_preview() {
        let mut update = update(vec![rect("a", 0.0, 0.0, 100.0, 100.0)]);
        update.placeholder = Some(rect("b", 100.0, 0.0, 100.0, 100.0));
        update.dragged = Some(rect("b", 133.3, 12.7, 100.0, 100.0));
        let mut surface = RecordingSurface::new();
        let color = Color::from_rgba8(0, 0, 0, 128);
        let ctx = RenderContext::new(&update).with_placeholder_color(color);
        apply_update(&mut surface, &ctx).unwrap();

        let frame = surface.frame("g").unwrap();
        let (placeholder, fill) = frame.placeholder.unwrap();
        assert_eq!(placeholder, Rect::new(100.0, 0.0, 200.0, 100.0));
        assert_eq!(fill.to_rgba8().a, 128);
        let dragged = frame.items["b"];
        assert_eq!(dragged.style, ItemStyle::Dragging);
        assert_eq!(dragged.rect.x0, 133.3);
        assert_eq!(dragged.rect.y0, 12.7);
    }

    #[test]
    fn test_snap_rect() {
        let snapped = snap_rect(Rect::new(10.2, 10.26, 20.7, 30.74), 2.0);
        assert_eq!(snapped, Rect::new(10.0, 10.5, 20.5, 30.5));
        let unchanged = snap_rect(Rect::new(0.3, 0.3, 1.3, 1.3), 0.0);
        assert_eq!(unchanged, Rect::new(0.3, 0.3, 1.3, 1.3));
    }

    #[test]
    fn test_snapping_can_be_disabled() {
        let update = update(vec![rect("a", 33.33, 0.0, 33.33, 50.0)]);
        let mut surface = RecordingSurface::new();
        let ctx = RenderContext::new(&update).with_pixel_snapping(false);
        apply_update(&mut surface, &ctx).unwrap();
        assert_eq!(surface.frame("g").unwrap().items["a"].rect.x0, 33.33);

        let ctx = RenderContext::new(&update);
        apply_update(&mut surface, &ctx).unwrap();
        assert_eq!(surface.frame("g").unwrap().items["a"].rect.x0, 33.0);
    }

    #[test]
    fn test_invalid_rect_is_rejected() {
        let update = update(vec![rect("a", 0.0, 0.0, f64::NAN, 10.0)]);
        let mut surface = RecordingSurface::new();
        let err = apply_update(&mut surface, &RenderContext::new(&update)).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidRect { ref id, .. } if id == "a"));
        assert!(surface.frame("g").is_none());
    }

    #[test]
    fn test_place_outside_frame_fails() {
        let mut surface = RecordingSurface::new();
        let err = surface
            .place_item("g", "a", Rect::ZERO, ItemStyle::Resting)
            .unwrap_err();
        assert!(matches!(err, SurfaceError::Surface(_)));
    }

    #[test]
    fn test_forget_grid() {
        let update = update(vec![rect("a", 0.0, 0.0, 10.0, 10.0)]);
        let mut surface = RecordingSurface::new();
        apply_update(&mut surface, &RenderContext::new(&update)).unwrap();
        assert!(surface.forget("g"));
        assert!(surface.frame("g").is_none());
        assert_eq!(surface.frames().count(), 0);
    }
}
