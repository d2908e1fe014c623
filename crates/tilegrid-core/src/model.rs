//! Grid coordinate model: items, layouts and grid configuration.

use crate::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identifier of an item inside a layout.
pub type ItemId = String;

/// Identifier of a grid instance.
pub type GridId = String;

/// Ordered sequence of items. Ids are unique; order is only used as a
/// tie-break by compaction.
pub type Layout = Vec<GridItem>;

/// Prefix of the ids reserved for cross-grid placeholder entries.
pub const PLACEHOLDER_PREFIX: &str = "tilegrid:placeholder:";

/// Default number of columns.
pub const DEFAULT_COLS: i32 = 6;
/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 100.0;

/// A rectangular item positioned on the grid, in cell units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub id: ItemId,
    /// Column of the left edge.
    pub x: i32,
    /// Row of the top edge.
    pub y: i32,
    /// Width in columns.
    pub w: i32,
    /// Height in rows.
    pub h: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<i32>,
    /// Static items never move and act purely as obstacles.
    #[serde(default, rename = "static", skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
}

impl GridItem {
    /// Create a new item without size constraints.
    pub fn new(id: impl Into<ItemId>, x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            min_w: None,
            max_w: None,
            min_h: None,
            max_h: None,
            is_static: false,
        }
    }

    /// Set the width bounds.
    pub fn with_width_bounds(mut self, min_w: Option<i32>, max_w: Option<i32>) -> Self {
        self.min_w = min_w;
        self.max_w = max_w;
        self
    }

    /// Set the height bounds.
    pub fn with_height_bounds(mut self, min_h: Option<i32>, max_h: Option<i32>) -> Self {
        self.min_h = min_h;
        self.max_h = max_h;
        self
    }

    /// Mark the item as static.
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Column just past the right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Row just past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Smallest width allowed by the item's constraints.
    pub fn min_width(&self) -> i32 {
        self.min_w.unwrap_or(1).max(1)
    }

    /// Smallest height allowed by the item's constraints.
    pub fn min_height(&self) -> i32 {
        self.min_h.unwrap_or(1).max(1)
    }

    /// Clamp a width into the item's constraints.
    pub fn clamp_width(&self, w: i32) -> i32 {
        clamp_span(w, self.min_width(), self.max_w)
    }

    /// Clamp a height into the item's constraints.
    pub fn clamp_height(&self, h: i32) -> i32 {
        clamp_span(h, self.min_height(), self.max_h)
    }

    /// Whether the id belongs to the placeholder namespace.
    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(&self.id)
    }
}

fn clamp_span(value: i32, min: i32, max: Option<i32>) -> i32 {
    let value = value.max(min);
    match max {
        Some(max) if max >= min => value.min(max),
        _ => value,
    }
}

/// Placeholder id used for the ephemeral entry of a session.
pub fn placeholder_id(session: Uuid) -> ItemId {
    format!("{PLACEHOLDER_PREFIX}{session}")
}

/// Check whether an id is inside the reserved placeholder namespace.
pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Find an item by id.
pub fn find_item<'a>(layout: &'a [GridItem], id: &str) -> Option<&'a GridItem> {
    layout.iter().find(|item| item.id == id)
}

/// Find an item by id, mutably.
pub fn find_item_mut<'a>(layout: &'a mut [GridItem], id: &str) -> Option<&'a mut GridItem> {
    layout.iter_mut().find(|item| item.id == id)
}

/// Index of an item in the layout.
pub fn position_of(layout: &[GridItem], id: &str) -> Option<usize> {
    layout.iter().position(|item| item.id == id)
}

/// Lowest occupied row boundary (`max(y + h)`), 0 for an empty layout.
pub fn layout_bottom(layout: &[GridItem]) -> i32 {
    layout.iter().map(GridItem::bottom).max().unwrap_or(0).max(0)
}

/// Direction in which layouts are compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactType {
    /// Items float towards the top.
    Vertical,
    /// Items float towards the left.
    Horizontal,
}

/// Row height: a fixed pixel value, or rows stretched to fit the grid height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RowHeightRepr", into = "RowHeightRepr")]
pub enum RowHeight {
    Pixels(f64),
    Fit,
}

impl Default for RowHeight {
    fn default() -> Self {
        RowHeight::Pixels(DEFAULT_ROW_HEIGHT)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RowHeightRepr {
    Pixels(f64),
    Keyword(String),
}

impl TryFrom<RowHeightRepr> for RowHeight {
    type Error = String;

    fn try_from(repr: RowHeightRepr) -> Result<Self, Self::Error> {
        match repr {
            RowHeightRepr::Pixels(px) => Ok(RowHeight::Pixels(px)),
            RowHeightRepr::Keyword(word) if word == "fit" => Ok(RowHeight::Fit),
            RowHeightRepr::Keyword(word) => Err(format!("unknown row height keyword: {word}")),
        }
    }
}

impl From<RowHeight> for RowHeightRepr {
    fn from(value: RowHeight) -> Self {
        match value {
            RowHeight::Pixels(px) => RowHeightRepr::Pixels(px),
            RowHeight::Fit => RowHeightRepr::Keyword("fit".to_string()),
        }
    }
}

/// Configuration of one grid instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Number of columns.
    pub cols: i32,
    /// Row height in pixels, or `"fit"`.
    pub row_height: RowHeight,
    /// Fixed grid height in pixels. `None` lets the grid grow with its items.
    pub height: Option<f64>,
    /// Gap between cells in pixels.
    pub gap: f64,
    /// When set, dragged items are blocked by other items instead of pushing them.
    pub prevent_collision: bool,
    /// Compaction direction, `None` for free placement.
    pub compact_type: Option<CompactType>,
    /// Compact the layout whenever the layout, columns or compaction type change.
    pub compact_on_props_change: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            row_height: RowHeight::default(),
            height: None,
            gap: 0.0,
            prevent_collision: false,
            compact_type: Some(CompactType::Vertical),
            compact_on_props_change: true,
        }
    }
}

impl GridConfig {
    /// Create a configuration with the given number of columns.
    pub fn new(cols: i32) -> Self {
        Self {
            cols,
            ..Self::default()
        }
    }

    pub fn with_row_height(mut self, row_height: RowHeight) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_height(mut self, height: Option<f64>) -> Self {
        self.height = height;
        self
    }

    pub fn with_compact_type(mut self, compact_type: Option<CompactType>) -> Self {
        self.compact_type = compact_type;
        self
    }

    pub fn with_prevent_collision(mut self, prevent_collision: bool) -> Self {
        self.prevent_collision = prevent_collision;
        self
    }

    /// Normalize user supplied numbers: columns and fixed row heights are
    /// rounded and at least 1, gap and height are at least 0.
    pub fn normalized(&self) -> Self {
        let row_height = match self.row_height {
            RowHeight::Pixels(px) if px.is_finite() => RowHeight::Pixels(px.round().max(1.0)),
            RowHeight::Pixels(_) => RowHeight::default(),
            RowHeight::Fit => RowHeight::Fit,
        };
        Self {
            cols: self.cols.max(1),
            row_height,
            height: self.height.filter(|h| h.is_finite()).map(|h| h.max(0.0)),
            gap: if self.gap.is_finite() { self.gap.max(0.0) } else { 0.0 },
            ..self.clone()
        }
    }
}

/// Validate the geometry of a single item.
pub fn validate(item: &GridItem, config: &GridConfig) -> GridResult<()> {
    if item.x < 0 || item.y < 0 {
        return Err(GridError::bounds(&item.id, format!("negative position ({}, {})", item.x, item.y)));
    }
    if item.w < 1 || item.h < 1 {
        return Err(GridError::bounds(&item.id, format!("non-positive span {}x{}", item.w, item.h)));
    }
    if item.w < item.min_width() {
        return Err(GridError::bounds(&item.id, format!("w {} below minW {}", item.w, item.min_width())));
    }
    if let Some(max_w) = item.max_w {
        if item.w > max_w {
            return Err(GridError::bounds(&item.id, format!("w {} above maxW {max_w}", item.w)));
        }
    }
    if item.h < item.min_height() {
        return Err(GridError::bounds(&item.id, format!("h {} below minH {}", item.h, item.min_height())));
    }
    if let Some(max_h) = item.max_h {
        if item.h > max_h {
            return Err(GridError::bounds(&item.id, format!("h {} above maxH {max_h}", item.h)));
        }
    }
    if item.min_width() > config.cols {
        return Err(GridError::bounds(&item.id, format!("minW {} exceeds {} columns", item.min_width(), config.cols)));
    }
    Ok(())
}

/// Validate a whole layout: item geometry, unique ids and no reserved ids.
pub fn validate_layout(layout: &[GridItem], config: &GridConfig) -> GridResult<()> {
    let mut seen = HashSet::new();
    for item in layout {
        if is_placeholder_id(&item.id) {
            return Err(GridError::ReservedItemId(item.id.clone()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(GridError::DuplicateItemId(item.id.clone()));
        }
        validate(item, config)?;
    }
    Ok(())
}

/// Result of [`sanitize_layout`].
#[derive(Debug, Clone, Default)]
pub struct Sanitized {
    /// The corrected layout, in input order.
    pub layout: Layout,
    /// Items whose constraints contradict each other. They are left untouched
    /// and excluded from compaction.
    pub excluded: HashSet<ItemId>,
    /// Problems found, recovered or not.
    pub warnings: Vec<GridError>,
}

/// Recover what can be recovered from a malformed layout.
///
/// Negative positions are moved to 0, spans are clamped into their bounds and
/// into `cols`. Items with contradictory bounds (`minW > maxW`) are excluded.
/// Duplicate ids keep their first occurrence; ids in the placeholder
/// namespace are dropped.
pub fn sanitize_layout(layout: &[GridItem], cols: i32) -> Sanitized {
    let cols = cols.max(1);
    let mut out = Sanitized::default();
    let mut seen = HashSet::new();

    for item in layout {
        if item.is_placeholder() {
            log::warn!("Dropping layout item {} with a reserved id", item.id);
            out.warnings.push(GridError::ReservedItemId(item.id.clone()));
            continue;
        }
        if !seen.insert(item.id.clone()) {
            log::warn!("Dropping duplicate layout item {}", item.id);
            out.warnings.push(GridError::DuplicateItemId(item.id.clone()));
            continue;
        }

        let contradictory = matches!((item.min_w, item.max_w), (Some(min), Some(max)) if min > max)
            || matches!((item.min_h, item.max_h), (Some(min), Some(max)) if min > max);
        if contradictory {
            log::warn!("Item {} has contradictory size bounds, leaving it out of compaction", item.id);
            out.warnings
                .push(GridError::bounds(&item.id, "minimum bound exceeds maximum bound"));
            out.excluded.insert(item.id.clone());
            out.layout.push(item.clone());
            continue;
        }

        let mut fixed = item.clone();
        fixed.x = fixed.x.max(0);
        fixed.y = fixed.y.max(0);
        fixed.w = fixed.clamp_width(fixed.w).min(cols);
        fixed.h = fixed.clamp_height(fixed.h);
        if fixed != *item {
            log::warn!(
                "Clamped item {} from ({}, {}, {}x{}) to ({}, {}, {}x{})",
                item.id, item.x, item.y, item.w, item.h, fixed.x, fixed.y, fixed.w, fixed.h
            );
            out.warnings.push(GridError::bounds(&item.id, "geometry clamped into bounds"));
        }
        out.layout.push(fixed);
    }

    out
}
