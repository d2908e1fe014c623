//! Conversion between grid cells and pixel rectangles.
//!
//! Pixel values stay real numbers. Snapping to device pixels is left to the
//! rendering surface.

use crate::error::{GridError, GridResult};
use crate::model::{GridConfig, GridId, GridItem, ItemId, RowHeight, layout_bottom};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pixel rectangle of one item, relative to the grid's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRect {
    pub id: ItemId,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderRect {
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height)
    }
}

/// Render rects keyed by item id, in id order.
pub type RenderRects = BTreeMap<ItemId, RenderRect>;

/// Pixel size of one cell and the gap between cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cols: i32,
    pub col_width: f64,
    pub row_height: f64,
    pub gap: f64,
}

impl CellMetrics {
    /// Metrics of a grid of the given pixel size.
    ///
    /// `container_height` is only used for `"fit"` row heights.
    pub fn new(layout: &[GridItem], config: &GridConfig, container_width: f64, container_height: f64) -> GridResult<Self> {
        let config = config.normalized();
        Ok(Self {
            cols: config.cols,
            col_width: column_width(&config, container_width),
            row_height: row_height_px(layout, &config, container_height)?,
            gap: config.gap,
        })
    }

    pub fn item_rect(&self, item: &GridItem) -> RenderRect {
        let (x, y, w, h) = (f64::from(item.x), f64::from(item.y), f64::from(item.w), f64::from(item.h));
        RenderRect {
            id: item.id.clone(),
            top: y * self.row_height + self.gap * y,
            left: x * self.col_width + self.gap * x,
            width: w * self.col_width + self.gap * (w - 1.0).max(0.0),
            height: h * self.row_height + self.gap * (h - 1.0).max(0.0),
        }
    }

    /// Column of a pixel offset from the grid's left edge.
    pub fn screen_x_to_grid_x(&self, px: f64) -> i32 {
        screen_x_to_grid_x(px, self.cols, self.col_width, self.gap)
    }

    /// Row of a pixel offset from the grid's top edge.
    pub fn screen_y_to_grid_y(&self, px: f64) -> i32 {
        screen_y_to_grid_y(px, self.row_height, self.gap)
    }
}

/// Width of one column: the container width minus all gaps, split evenly.
pub fn column_width(config: &GridConfig, container_width: f64) -> f64 {
    let cols = config.cols.max(1);
    let gaps = (config.gap * f64::from(cols - 1)).max(0.0);
    ((container_width - gaps) / f64::from(cols)).max(0.0)
}

/// Row height that makes the occupied rows fill `height` exactly.
pub fn fit_row_height(layout: &[GridItem], height: f64, gap: f64) -> f64 {
    let rows = f64::from(layout_bottom(layout).max(1));
    ((height - gap * (rows - 1.0)) / rows).max(1.0)
}

/// Effective row height in pixels.
pub fn row_height_px(layout: &[GridItem], config: &GridConfig, container_height: f64) -> GridResult<f64> {
    match config.row_height {
        RowHeight::Pixels(px) => Ok(px),
        RowHeight::Fit => {
            let height = config.height.unwrap_or(container_height);
            if !height.is_finite() || height <= 0.0 {
                return Err(GridError::ConfigMismatch(
                    "row height \"fit\" needs a positive grid height".to_string(),
                ));
            }
            Ok(fit_row_height(layout, height, config.gap))
        }
    }
}

/// Pixel height taken by the layout's items, 0 when empty.
pub fn grid_pixel_height(layout: &[GridItem], row_height: f64, gap: f64) -> f64 {
    layout
        .iter()
        .map(|item| {
            let rows = f64::from(item.bottom());
            rows * row_height + (rows - 1.0).max(0.0) * gap
        })
        .fold(0.0, f64::max)
}

/// Pixel height of the grid container.
///
/// A fixed `height` wins. `"fit"` grids use the measured height; without one
/// this is a [`GridError::ConfigMismatch`]. Otherwise the height follows the
/// items.
pub fn container_height(layout: &[GridItem], config: &GridConfig, measured_height: Option<f64>) -> GridResult<f64> {
    let config = config.normalized();
    if let Some(height) = config.height {
        return Ok(height);
    }
    match config.row_height {
        RowHeight::Fit => measured_height
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or_else(|| GridError::ConfigMismatch("row height \"fit\" without a grid height".to_string())),
        RowHeight::Pixels(px) => Ok(grid_pixel_height(layout, px, config.gap)),
    }
}

/// Map every item of the layout to its pixel rectangle.
pub fn to_pixel_rects(
    layout: &[GridItem],
    config: &GridConfig,
    container_width: f64,
    container_height: f64,
) -> GridResult<RenderRects> {
    let metrics = CellMetrics::new(layout, config, container_width, container_height)?;
    Ok(layout
        .iter()
        .map(|item| (item.id.clone(), metrics.item_rect(item)))
        .collect())
}

/// Everything a rendering surface needs to draw one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderUpdate {
    pub grid: GridId,
    pub rects: RenderRects,
    pub container_height: f64,
    /// Snapped cell rect shown under the item being dragged or resized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<RenderRect>,
    /// Unsnapped rect of the item following the pointer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dragged: Option<RenderRect>,
}

/// Render a layout into a grid of the given client width and measured height.
pub fn render_update(
    grid: &str,
    layout: &[GridItem],
    config: &GridConfig,
    width: f64,
    measured_height: f64,
) -> GridResult<RenderUpdate> {
    let height = container_height(layout, config, Some(measured_height))?;
    Ok(RenderUpdate {
        grid: grid.to_string(),
        rects: to_pixel_rects(layout, config, width, height)?,
        container_height: height,
        placeholder: None,
        dragged: None,
    })
}

/// Largest cell coordinate or span derived from pixels.
pub const MAX_CELL: i32 = 100_000;

/// Column under a pixel offset, rounded to the nearest cell.
pub fn screen_x_to_grid_x(px: f64, cols: i32, col_width: f64, gap: f64) -> i32 {
    let step = col_width + gap;
    if cols <= 1 || step <= 0.0 || !px.is_finite() {
        return 0;
    }
    to_cell(px / step)
}

/// Row under a pixel offset, rounded to the nearest cell.
pub fn screen_y_to_grid_y(px: f64, row_height: f64, gap: f64) -> i32 {
    let step = row_height + gap;
    if step <= 0.0 || !px.is_finite() {
        return 0;
    }
    to_cell(px / step)
}

/// Number of cells a pixel length covers, rounded to the nearest span.
pub fn pixels_to_span(px: f64, cell: f64, gap: f64) -> i32 {
    let step = cell + gap;
    if step <= 0.0 || !px.is_finite() {
        return 1;
    }
    to_cell((px + gap) / step)
}

/// Round a cell coordinate, keeping it within `±MAX_CELL`.
fn to_cell(cells: f64) -> i32 {
    let limit = f64::from(MAX_CELL);
    cells.round().clamp(-limit, limit) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_fills_single_column() {
        let config = GridConfig::new(1);
        let layout = vec![GridItem::new("a", 0, 0, 1, 1)];
        let rects = to_pixel_rects(&layout, &config, 200.0, 0.0).unwrap();
        assert_eq!(
            rects["a"],
            RenderRect {
                id: "a".into(),
                top: 0.0,
                left: 0.0,
                width: 200.0,
                height: 100.0,
            }
        );
    }

    #[test]
    fn test_rects_with_gap() {
        let config = GridConfig::new(4).with_gap(10.0).with_row_height(RowHeight::Pixels(50.0));
        let layout = vec![GridItem::new("a", 1, 2, 2, 3)];
        let rects = to_pixel_rects(&layout, &config, 430.0, 0.0).unwrap();
        let rect = &rects["a"];
        // (430 - 30) / 4 = 100 per column
        assert_eq!(rect.left, 110.0);
        assert_eq!(rect.top, 120.0);
        assert_eq!(rect.width, 210.0);
        assert_eq!(rect.height, 170.0);
        assert_eq!(rect.to_rect(), Rect::new(110.0, 120.0, 320.0, 290.0));
    }

    #[test]
    fn test_rects_are_ordered_by_id() {
        let config = GridConfig::new(2);
        let layout = vec![GridItem::new("b", 0, 0, 1, 1), GridItem::new("a", 1, 0, 1, 1)];
        let rects = to_pixel_rects(&layout, &config, 100.0, 0.0).unwrap();
        assert_eq!(rects.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_grid_pixel_height() {
        assert_eq!(grid_pixel_height(&[], 100.0, 10.0), 0.0);
        let layout = vec![GridItem::new("a", 0, 0, 1, 2), GridItem::new("b", 0, 2, 1, 1)];
        assert_eq!(grid_pixel_height(&layout, 100.0, 10.0), 320.0);
    }

    #[test]
    fn test_fit_row_height() {
        let layout = vec![GridItem::new("a", 0, 0, 1, 4)];
        assert_eq!(fit_row_height(&layout, 430.0, 10.0), 100.0);
        assert_eq!(fit_row_height(&[], 80.0, 10.0), 80.0);
        assert_eq!(fit_row_height(&layout, 0.0, 10.0), 1.0);
    }

    #[test]
    fn test_fit_without_height_is_config_mismatch() {
        let config = GridConfig::new(2).with_row_height(RowHeight::Fit);
        let layout = vec![GridItem::new("a", 0, 0, 1, 1)];
        assert!(matches!(
            to_pixel_rects(&layout, &config, 100.0, 0.0),
            Err(GridError::ConfigMismatch(_))
        ));
        assert!(matches!(
            container_height(&layout, &config, None),
            Err(GridError::ConfigMismatch(_))
        ));
        assert_eq!(container_height(&layout, &config, Some(300.0)).unwrap(), 300.0);
        let rects = to_pixel_rects(&layout, &config, 100.0, 300.0).unwrap();
        assert_eq!(rects["a"].height, 300.0);
    }

    #[test]
    fn test_container_height_prefers_fixed_height() {
        let layout = vec![GridItem::new("a", 0, 0, 1, 3)];
        let fixed = GridConfig::new(2).with_height(Some(120.0));
        assert_eq!(container_height(&layout, &fixed, Some(999.0)).unwrap(), 120.0);
        let auto = GridConfig::new(2);
        assert_eq!(container_height(&layout, &auto, Some(999.0)).unwrap(), 300.0);
    }

    #[test]
    fn test_render_update_uses_container_height() {
        let config = GridConfig::new(2).with_row_height(RowHeight::Fit);
        let layout = vec![GridItem::new("a", 0, 0, 1, 1), GridItem::new("b", 1, 1, 1, 1)];
        let update = render_update("g", &layout, &config, 200.0, 400.0).unwrap();
        assert_eq!(update.container_height, 400.0);
        assert_eq!(update.rects["b"].top, 200.0);
        assert!(update.placeholder.is_none());
    }

    #[test]
    fn test_screen_to_grid() {
        assert_eq!(screen_x_to_grid_x(149.0, 4, 90.0, 10.0), 1);
        assert_eq!(screen_x_to_grid_x(151.0, 4, 90.0, 10.0), 2);
        assert_eq!(screen_x_to_grid_x(500.0, 1, 90.0, 10.0), 0);
        assert_eq!(screen_y_to_grid_y(260.0, 100.0, 0.0), 3);
        assert_eq!(screen_y_to_grid_y(-40.0, 100.0, 0.0), 0);
        assert_eq!(screen_y_to_grid_y(1e12, 100.0, 0.0), MAX_CELL);
        assert_eq!(screen_x_to_grid_x(-1e12, 4, 90.0, 10.0), -MAX_CELL);
    }

    #[test]
    fn test_pixels_to_span() {
        assert_eq!(pixels_to_span(190.0, 90.0, 10.0), 2);
        assert_eq!(pixels_to_span(250.0, 90.0, 10.0), 3);
        assert_eq!(pixels_to_span(0.0, 0.0, 0.0), 1);
        assert_eq!(pixels_to_span(1e15, 90.0, 10.0), MAX_CELL);
    }
}
