//! Tilegrid Core Library
//!
//! Platform-agnostic grid layout engine: the item model, compaction and
//! collision resolution, pixel mapping, drag/resize simulation and the
//! interaction state machine shared by connected grids.

pub mod autoscroll;
pub mod compact;
pub mod dispatch;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod input;
pub mod model;
pub mod registry;
pub mod session;
pub mod simulate;

pub use autoscroll::{ScrollDirection, scroll_direction};
pub use compact::{Resolution, collides, compact, has_overlaps, resolve_collisions};
pub use dispatch::Dispatcher;
pub use effect::{Effect, Notification};
pub use error::{GridError, GridResult};
pub use geometry::{RenderRect, RenderRects, RenderUpdate, container_height, grid_pixel_height, to_pixel_rects};
pub use input::{EventQueue, InputEvent, TickThrottle};
pub use model::{CompactType, GridConfig, GridId, GridItem, ItemId, Layout, RowHeight, sanitize_layout, validate, validate_layout};
pub use registry::{Grid, GridRegistry};
pub use session::{DragSession, EngineSettings, Phase, SessionState, transition};
pub use simulate::{DragTick, InteractionKind, SimulationResult, simulate_drag, simulate_resize};
