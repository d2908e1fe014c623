//! Tilegrid Render Library
//!
//! Presents the pixel rectangles produced by `tilegrid-core` on a host
//! surface. The core never draws; a [`Surface`] receives item rects, the
//! container height and the drag preview once per render update.

mod surface;

pub use surface::{
    GridFrame, ItemStyle, PlacedItem, RecordingSurface, RenderContext, Surface, SurfaceError,
    SurfaceResult, apply_update, snap_rect,
};
