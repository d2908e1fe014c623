//! Registered grid instances and their committed layouts.

use crate::compact::compact;
use crate::error::{GridError, GridResult};
use crate::geometry::{RenderUpdate, render_update};
use crate::model::{GridConfig, GridId, GridItem, ItemId, Layout, sanitize_layout};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One grid instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub id: GridId,
    #[serde(default)]
    pub config: GridConfig,
    #[serde(default)]
    pub layout: Layout,
    /// Client rect of the grid element.
    pub rect: Rect,
    /// Grids whose items may be dropped into this one.
    #[serde(default)]
    pub connected_to: Vec<GridId>,
    /// Client rect of the scroll container around the grid, if any.
    #[serde(default)]
    pub scroll_container: Option<Rect>,
    /// Items with contradictory bounds, kept out of compaction and dragging.
    #[serde(skip)]
    excluded: HashSet<ItemId>,
}

impl Grid {
    pub fn new(id: impl Into<GridId>, config: GridConfig, rect: Rect) -> Self {
        Self {
            id: id.into(),
            config,
            layout: Vec::new(),
            rect,
            connected_to: Vec::new(),
            scroll_container: None,
            excluded: HashSet::new(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_connected_to(mut self, connected_to: Vec<GridId>) -> Self {
        self.connected_to = connected_to;
        self
    }

    pub fn with_scroll_container(mut self, scroll_container: Option<Rect>) -> Self {
        self.scroll_container = scroll_container;
        self
    }

    /// Whether items of grid `source` may be dropped here.
    pub fn accepts_from(&self, source: &str) -> bool {
        self.id != source && self.connected_to.iter().any(|id| id == source)
    }

    pub fn contains(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    /// Committed layout without the excluded items.
    pub fn movable_layout(&self) -> Layout {
        self.layout
            .iter()
            .filter(|item| !self.excluded.contains(&item.id))
            .cloned()
            .collect()
    }

    /// Append the excluded items of the committed layout to `layout`.
    pub fn with_excluded(&self, mut layout: Layout) -> Layout {
        layout.extend(
            self.layout
                .iter()
                .filter(|item| self.excluded.contains(&item.id))
                .cloned(),
        );
        layout
    }

    /// Compact a working layout with this grid's configuration.
    pub fn compact(&self, layout: &[GridItem]) -> Layout {
        compact(layout, self.config.compact_type, self.config.cols)
    }

    /// Render update for any layout of this grid.
    pub fn render(&self, layout: &[GridItem]) -> GridResult<RenderUpdate> {
        render_update(&self.id, layout, &self.config, self.rect.width(), self.rect.height())
    }

    /// Render update for the committed layout.
    pub fn render_committed(&self) -> GridResult<RenderUpdate> {
        self.render(&self.layout)
    }

    /// Normalize the configuration, sanitize the layout and compact it when
    /// the grid compacts on changes. Returns the recovered problems.
    fn refresh(&mut self) -> Vec<GridError> {
        self.config = self.config.normalized();
        let sanitized = sanitize_layout(&self.layout, self.config.cols);
        self.excluded = sanitized.excluded;
        self.layout = sanitized.layout;
        if self.config.compact_on_props_change {
            let compacted = self.compact(&self.movable_layout());
            self.layout = self.with_excluded(compacted);
        }
        sanitized.warnings
    }
}

/// All grids known to a dispatcher, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct GridRegistry {
    grids: BTreeMap<GridId, Grid>,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid. Its layout is sanitized (and compacted when configured);
    /// the recovered problems are returned.
    pub fn register(&mut self, mut grid: Grid) -> GridResult<Vec<GridError>> {
        if self.grids.contains_key(&grid.id) {
            return Err(GridError::DuplicateGrid(grid.id));
        }
        let warnings = grid.refresh();
        log::info!("Registered grid {} with {} items", grid.id, grid.layout.len());
        self.grids.insert(grid.id.clone(), grid);
        Ok(warnings)
    }

    pub fn unregister(&mut self, id: &str) -> Option<Grid> {
        let removed = self.grids.remove(id);
        if removed.is_some() {
            log::info!("Unregistered grid {id}");
        }
        removed
    }

    pub fn get(&self, id: &str) -> GridResult<&Grid> {
        self.grids.get(id).ok_or_else(|| GridError::UnknownGrid(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> GridResult<&mut Grid> {
        self.grids.get_mut(id).ok_or_else(|| GridError::UnknownGrid(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.grids.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grid> {
        self.grids.values()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Replace a grid's layout.
    pub fn set_layout(&mut self, id: &str, layout: Layout) -> GridResult<Vec<GridError>> {
        let grid = self.get_mut(id)?;
        grid.layout = layout;
        Ok(grid.refresh())
    }

    /// Replace a grid's configuration.
    pub fn set_config(&mut self, id: &str, config: GridConfig) -> GridResult<Vec<GridError>> {
        let grid = self.get_mut(id)?;
        grid.config = config;
        Ok(grid.refresh())
    }

    /// Move or resize a grid's client rect.
    pub fn set_rect(&mut self, id: &str, rect: Rect) -> GridResult<()> {
        self.get_mut(id)?.rect = rect;
        Ok(())
    }

    /// Store a layout produced by a finished interaction.
    pub fn commit(&mut self, id: &str, layout: Layout) -> GridResult<()> {
        let grid = self.get_mut(id)?;
        log::debug!("Committed {} items to grid {id}", layout.len());
        grid.layout = layout;
        Ok(())
    }

    /// Grid under `point` that accepts items from `source`, in id order.
    pub fn drop_target_at(&self, point: Point, source: &str) -> Option<&Grid> {
        self.grids
            .values()
            .find(|grid| grid.accepts_from(source) && grid.contains(point))
    }
}
