//! The interaction state machine.
//!
//! A session lives from pointer-down on an item to pointer-up, pointer-cancel
//! or cancellation. Every transition is a pure function of the current state,
//! one input event and a read-only view of the registry; the resulting
//! [`Effect`]s are applied by the dispatcher.

use crate::autoscroll::{DEFAULT_SCROLL_PROXIMITY, DEFAULT_SCROLL_SPEED, ScrollDirection, scroll_direction};
use crate::effect::{Effect, Notification};
use crate::error::{GridError, GridResult};
use crate::input::{DEFAULT_THROTTLE_MS, InputEvent, TickThrottle};
use crate::model::{GridId, GridItem, ItemId, Layout, find_item, find_item_mut, layout_bottom, placeholder_id};
use crate::geometry::RenderRect;
use crate::registry::{Grid, GridRegistry};
use crate::simulate::{DragTick, InteractionKind, simulate};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tunables of the interaction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Minimal interval between two applied pointer moves, in milliseconds.
    pub throttle_ms: u64,
    /// Pixels scrolled per frame while auto-scrolling.
    pub scroll_speed: f64,
    /// Edge band that triggers auto-scrolling, as a fraction of the container size.
    pub scroll_proximity: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            scroll_proximity: DEFAULT_SCROLL_PROXIMITY,
        }
    }
}

/// Observable phase of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Active { kind: InteractionKind, source: GridId },
    TransferredTarget { source: GridId, target: GridId },
}

/// Working state of one drag or resize.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub id: Uuid,
    pub kind: InteractionKind,
    pub item: ItemId,
    pub source: GridId,
    /// Grid the item was transferred to, if any.
    pub target: Option<GridId>,
    pub pointer_start: Point,
    /// Last applied pointer position.
    pub pointer_now: Point,
    pub scroll_delta: Vec2,
    /// Client rect of the item at pointer-down.
    pub item_start_rect: Rect,
    /// Working layout of the source grid.
    pub source_layout: Layout,
    /// Working layout of the target grid, placeholder included.
    pub target_layout: Layout,
    pub throttle: TickThrottle,
    pub auto_scroll: ScrollDirection,
    /// Grid whose scroll container is auto-scrolling.
    pub scroll_grid: Option<GridId>,
    /// Last unsnapped rect of the item.
    pub item_rect: Option<RenderRect>,
}

impl DragSession {
    pub fn phase(&self) -> Phase {
        match &self.target {
            Some(target) => Phase::TransferredTarget {
                source: self.source.clone(),
                target: target.clone(),
            },
            None => Phase::Active {
                kind: self.kind,
                source: self.source.clone(),
            },
        }
    }

    /// Id of the ephemeral entry standing in for the item in a target grid.
    pub fn placeholder_id(&self) -> ItemId {
        placeholder_id(self.id)
    }

    /// Grid the item is currently simulated in.
    pub fn active_grid(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source)
    }

    fn active_item_id(&self) -> ItemId {
        if self.target.is_some() {
            self.placeholder_id()
        } else {
            self.item.clone()
        }
    }

    fn active_layout(&self) -> &Layout {
        if self.target.is_some() {
            &self.target_layout
        } else {
            &self.source_layout
        }
    }

    fn active_layout_mut(&mut self) -> &mut Layout {
        if self.target.is_some() {
            &mut self.target_layout
        } else {
            &mut self.source_layout
        }
    }

    fn dragged_item(&self) -> GridResult<&GridItem> {
        find_item(&self.source_layout, &self.item).ok_or_else(|| GridError::UnknownItemId(self.item.clone()))
    }
}

/// State of the interaction state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Active(Box<DragSession>),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            SessionState::Active(session) => Some(&**session),
            SessionState::Idle => None,
        }
    }
}

/// Read-only inputs of a transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub registry: &'a GridRegistry,
    pub settings: &'a EngineSettings,
    /// Id given to a session started by this transition.
    pub session_id: Uuid,
}

/// Apply one input event.
pub fn transition(state: SessionState, event: &InputEvent, ctx: &TransitionContext) -> (SessionState, Vec<Effect>) {
    let mut effects = Vec::new();
    let next = match state {
        SessionState::Idle => idle(event, ctx, &mut effects),
        SessionState::Active(session) => active(*session, event, ctx, &mut effects),
    };
    (next, effects)
}

fn idle(event: &InputEvent, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> SessionState {
    match event {
        InputEvent::PointerDown {
            grid,
            item,
            kind,
            position,
            timestamp,
        } => match start(grid, item, *kind, *position, *timestamp, ctx, effects) {
            Ok(Some(session)) => SessionState::Active(Box::new(session)),
            Ok(None) => SessionState::Idle,
            Err(error) => {
                log::warn!("Cannot start session on grid {grid}: {error}");
                effects.push(Effect::Notify(Notification::warning(Some(grid.as_str()), error)));
                SessionState::Idle
            }
        },
        InputEvent::GridResized { grid, .. } => {
            if let Ok(grid) = ctx.registry.get(grid) {
                push_render(grid, &grid.layout, None, effects);
            }
            SessionState::Idle
        }
        _ => SessionState::Idle,
    }
}

fn start(
    grid_id: &str,
    item_id: &str,
    kind: InteractionKind,
    position: Point,
    timestamp: u64,
    ctx: &TransitionContext,
    effects: &mut Vec<Effect>,
) -> GridResult<Option<DragSession>> {
    let grid = ctx.registry.get(grid_id)?;
    let item = find_item(&grid.layout, item_id).ok_or_else(|| GridError::UnknownItemId(item_id.to_string()))?;
    if item.is_static || grid.is_excluded(item_id) {
        log::debug!("Item {item_id} of grid {grid_id} cannot be moved");
        return Ok(None);
    }

    let mut update = grid.render_committed()?;
    let local = update
        .rects
        .remove(item_id)
        .ok_or_else(|| GridError::UnknownItemId(item_id.to_string()))?;
    let item_start_rect = local.to_rect() + grid.rect.origin().to_vec2();

    let session = DragSession {
        id: ctx.session_id,
        kind,
        item: item_id.to_string(),
        source: grid_id.to_string(),
        target: None,
        pointer_start: position,
        pointer_now: position,
        scroll_delta: Vec2::ZERO,
        item_start_rect,
        source_layout: grid.movable_layout(),
        target_layout: Vec::new(),
        throttle: TickThrottle::new(ctx.settings.throttle_ms, timestamp),
        auto_scroll: ScrollDirection::NONE,
        scroll_grid: None,
        item_rect: Some(local.clone()),
    };
    log::info!("Session {} started: {kind:?} of {item_id} in grid {grid_id}", session.id);

    let (grid, item, layout) = (grid_id.to_string(), item.clone(), grid.layout.clone());
    effects.push(Effect::Notify(match kind {
        InteractionKind::Drag => Notification::DragStarted { grid, item, layout },
        InteractionKind::Resize => Notification::ResizeStarted { grid, item, layout },
    }));
    update.placeholder = Some(local.clone());
    update.dragged = Some(local);
    effects.push(Effect::Render(update));
    Ok(Some(session))
}

fn active(mut session: DragSession, event: &InputEvent, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> SessionState {
    match event {
        InputEvent::PointerDown { .. } => {
            log::debug!("Ignoring pointer-down during session {}", session.id);
            SessionState::Active(Box::new(session))
        }
        InputEvent::PointerMove { position, timestamp } => match session.throttle.offer(*position, *timestamp) {
            Some(position) => tick(session, position, ctx, effects),
            None => SessionState::Active(Box::new(session)),
        },
        InputEvent::Scroll { offset, .. } => {
            session.scroll_delta = *offset;
            let position = session.pointer_now;
            tick(session, position, ctx, effects)
        }
        InputEvent::Frame { timestamp } => {
            if let Some(grid) = &session.scroll_grid {
                effects.push(Effect::ScrollBy {
                    grid: grid.clone(),
                    delta: session.auto_scroll.step(ctx.settings.scroll_speed),
                });
            }
            match session.throttle.flush(*timestamp) {
                Some(position) => tick(session, position, ctx, effects),
                None => SessionState::Active(Box::new(session)),
            }
        }
        InputEvent::PointerUp { .. } | InputEvent::PointerCancel { .. } => {
            if let Some(position) = session.throttle.take_pending() {
                if let Err(error) = advance(&mut session, position, ctx, effects) {
                    if error.is_fatal_to_session() {
                        cancel(session, &error.to_string(), ctx, effects);
                        return SessionState::Idle;
                    }
                    effects.push(Effect::Notify(Notification::warning(Some(session.active_grid()), error)));
                }
            }
            stop_auto_scroll(&mut session, effects);
            if let Err(error) = complete(&session, ctx, effects) {
                cancel(session, &error.to_string(), ctx, effects);
            }
            SessionState::Idle
        }
        InputEvent::GridDestroyed { grid } if *grid == session.source => {
            cancel(session, "source grid destroyed", ctx, effects);
            SessionState::Idle
        }
        InputEvent::GridDestroyed { grid } if session.target.as_ref() == Some(grid) => {
            log::info!("Target grid {grid} destroyed, returning to {}", session.source);
            leave_target(&mut session, grid, ctx, effects);
            SessionState::Active(Box::new(session))
        }
        InputEvent::GridResized { grid, .. }
            if *grid == session.source || session.target.as_ref() == Some(grid) =>
        {
            let position = session.pointer_now;
            tick(session, position, ctx, effects)
        }
        InputEvent::GridResized { grid, .. } => {
            if let Ok(grid) = ctx.registry.get(grid) {
                push_render(grid, &grid.layout, None, effects);
            }
            SessionState::Active(Box::new(session))
        }
        InputEvent::GridDestroyed { .. } => SessionState::Active(Box::new(session)),
    }
}

/// Apply a pointer sample, cancelling the session on structural errors.
fn tick(mut session: DragSession, position: Point, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> SessionState {
    match advance(&mut session, position, ctx, effects) {
        Ok(()) => SessionState::Active(Box::new(session)),
        Err(error) if error.is_fatal_to_session() => {
            cancel(session, &error.to_string(), ctx, effects);
            SessionState::Idle
        }
        Err(error) => {
            log::warn!("Tick of session {} failed: {error}", session.id);
            effects.push(Effect::Notify(Notification::warning(Some(session.active_grid()), error)));
            SessionState::Active(Box::new(session))
        }
    }
}

fn advance(session: &mut DragSession, position: Point, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> GridResult<()> {
    session.pointer_now = position;
    if session.kind == InteractionKind::Drag {
        retarget(session, ctx, effects)?;
    }

    let grid = ctx.registry.get(session.active_grid())?;
    let drag_tick = DragTick {
        pointer_start: session.pointer_start,
        pointer_now: session.pointer_now,
        scroll_delta: session.scroll_delta,
        item_start_rect: session.item_start_rect,
        grid_rect: grid.rect,
    };
    let item_id = session.active_item_id();
    let result = simulate(session.kind, &item_id, session.active_layout(), &grid.config, &drag_tick)?;
    for warning in result.warnings {
        effects.push(Effect::Notify(Notification::warning(Some(grid.id.as_str()), warning)));
    }

    let item_rect = RenderRect {
        id: session.item.clone(),
        ..result.item_rect
    };
    let resized = session.kind == InteractionKind::Resize
        && session
            .item_rect
            .as_ref()
            .is_none_or(|last| last.width != item_rect.width || last.height != item_rect.height);
    if resized {
        effects.push(Effect::Notify(Notification::ItemResized {
            grid: grid.id.clone(),
            item: session.item.clone(),
            width: item_rect.width,
            height: item_rect.height,
        }));
    }

    *session.active_layout_mut() = result.layout;
    session.item_rect = Some(item_rect.clone());
    push_render(grid, session.active_layout(), Some((item_id.as_str(), item_rect)), effects);
    update_auto_scroll(session, ctx, effects);
    Ok(())
}

/// Move the session between its source and connected grids.
fn retarget(session: &mut DragSession, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> GridResult<()> {
    let position = session.pointer_now;
    if let Some(target) = &session.target {
        if ctx.registry.get(target).is_ok_and(|grid| grid.contains(position)) {
            return Ok(());
        }
    }

    let source = ctx.registry.get(&session.source)?;
    let next = if source.contains(position) {
        None
    } else {
        ctx.registry
            .drop_target_at(position, &session.source)
            .map(|grid| grid.id.clone())
    };
    if next == session.target {
        return Ok(());
    }

    if let Some(previous) = session.target.clone() {
        leave_target(session, &previous, ctx, effects);
    }
    if let Some(next) = next {
        enter_target(session, next, ctx, effects)?;
    }
    Ok(())
}

fn enter_target(session: &mut DragSession, target: GridId, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> GridResult<()> {
    let grid = ctx.registry.get(&target)?;
    let item = session.dragged_item()?.clone();
    let placeholder = session.placeholder_id();

    let mut layout = grid.movable_layout();
    if find_item(&layout, &placeholder).is_none() {
        layout.push(GridItem {
            id: placeholder,
            x: 0,
            y: layout_bottom(&layout),
            w: item.w.min(grid.config.cols),
            is_static: false,
            ..item.clone()
        });
    }
    log::info!("Session {} entered grid {target}", session.id);

    // The source keeps the item where it was last placed until the drop.
    if let Ok(source) = ctx.registry.get(&session.source) {
        push_render(source, &session.source_layout, None, effects);
    }
    effects.push(Effect::Notify(Notification::DragEntered {
        grid: target.clone(),
        item,
        source_grid: session.source.clone(),
    }));
    session.target = Some(target);
    session.target_layout = layout;
    Ok(())
}

/// Drop the placeholder and hand the item back to the source grid.
fn leave_target(session: &mut DragSession, target: &str, ctx: &TransitionContext, effects: &mut Vec<Effect>) {
    session.target = None;
    session.target_layout.clear();
    log::info!("Session {} left grid {target}", session.id);
    if let Ok(item) = session.dragged_item() {
        effects.push(Effect::Notify(Notification::DragExited {
            grid: target.to_string(),
            item: item.clone(),
            source_grid: session.source.clone(),
        }));
    }
    if let Ok(grid) = ctx.registry.get(target) {
        push_render(grid, &grid.layout, None, effects);
    }
}

fn update_auto_scroll(session: &mut DragSession, ctx: &TransitionContext, effects: &mut Vec<Effect>) {
    let grid_id = session.active_grid().to_string();
    let direction = ctx
        .registry
        .get(&grid_id)
        .ok()
        .and_then(|grid| grid.scroll_container)
        .map(|container| scroll_direction(container, session.pointer_now, ctx.settings.scroll_proximity))
        .unwrap_or(ScrollDirection::NONE);
    let scroll_grid = (!direction.is_none()).then_some(grid_id);

    if direction == session.auto_scroll && scroll_grid == session.scroll_grid {
        return;
    }
    if let Some(previous) = &session.scroll_grid {
        if scroll_grid.as_ref() != Some(previous) {
            effects.push(Effect::StopAutoScroll { grid: previous.clone() });
        }
    }
    log::debug!("Auto-scroll {:?} on {:?}", direction, scroll_grid);
    session.auto_scroll = direction;
    session.scroll_grid = scroll_grid;
}

fn stop_auto_scroll(session: &mut DragSession, effects: &mut Vec<Effect>) {
    if let Some(grid) = session.scroll_grid.take() {
        effects.push(Effect::StopAutoScroll { grid });
    }
    session.auto_scroll = ScrollDirection::NONE;
}

/// Commit the working layouts of a finished session.
fn complete(session: &DragSession, ctx: &TransitionContext, effects: &mut Vec<Effect>) -> GridResult<()> {
    let source = ctx.registry.get(&session.source)?;
    let Some(target_id) = &session.target else {
        let layout = source.with_excluded(session.source_layout.clone());
        let item = find_item(&layout, &session.item)
            .cloned()
            .ok_or_else(|| GridError::UnknownItemId(session.item.clone()))?;
        log::info!("Session {} completed in grid {}", session.id, source.id);

        effects.push(Effect::Commit {
            grid: source.id.clone(),
            layout: layout.clone(),
        });
        push_render(source, &layout, None, effects);
        effects.push(Effect::Notify(Notification::LayoutUpdated {
            grid: source.id.clone(),
            layout: layout.clone(),
        }));
        let grid = source.id.clone();
        effects.push(Effect::Notify(match session.kind {
            InteractionKind::Drag => Notification::DragEnded { grid, item, layout },
            InteractionKind::Resize => Notification::ResizeEnded { grid, item, layout },
        }));
        return Ok(());
    };

    let target = ctx.registry.get(target_id)?;
    let placeholder = session.placeholder_id();
    let mut dropped_layout = session.target_layout.clone();
    if let Some(item) = find_item_mut(&mut dropped_layout, &placeholder) {
        item.id = session.item.clone();
    }
    let dropped = find_item(&dropped_layout, &session.item)
        .cloned()
        .ok_or_else(|| GridError::UnknownItemId(session.item.clone()))?;
    let target_layout = target.with_excluded(dropped_layout);

    let remaining: Layout = session
        .source_layout
        .iter()
        .filter(|item| item.id != session.item)
        .cloned()
        .collect();
    let source_layout = source.with_excluded(source.compact(&remaining));
    log::info!(
        "Session {} dropped {} from grid {} into grid {}",
        session.id,
        session.item,
        source.id,
        target.id
    );

    effects.push(Effect::Commit {
        grid: target.id.clone(),
        layout: target_layout.clone(),
    });
    effects.push(Effect::Commit {
        grid: source.id.clone(),
        layout: source_layout.clone(),
    });
    push_render(target, &target_layout, None, effects);
    push_render(source, &source_layout, None, effects);
    effects.push(Effect::Notify(Notification::LayoutUpdated {
        grid: target.id.clone(),
        layout: target_layout.clone(),
    }));
    effects.push(Effect::Notify(Notification::Dropped {
        grid: target.id.clone(),
        item: dropped.clone(),
        source_grid: source.id.clone(),
        layout: target_layout,
    }));
    effects.push(Effect::Notify(Notification::ItemRemoved {
        grid: source.id.clone(),
        item: session.item.clone(),
        layout: source_layout.clone(),
    }));
    effects.push(Effect::Notify(Notification::LayoutUpdated {
        grid: source.id.clone(),
        layout: source_layout.clone(),
    }));
    effects.push(Effect::Notify(Notification::DragEnded {
        grid: source.id.clone(),
        item: dropped,
        layout: source_layout,
    }));
    Ok(())
}

/// End a session without committing anything.
fn cancel(mut session: DragSession, reason: &str, ctx: &TransitionContext, effects: &mut Vec<Effect>) {
    log::warn!("Session {} cancelled: {reason}", session.id);
    stop_auto_scroll(&mut session, effects);
    for grid_id in std::iter::once(&session.source).chain(session.target.as_ref()) {
        if let Ok(grid) = ctx.registry.get(grid_id) {
            push_render(grid, &grid.layout, None, effects);
        }
    }
    effects.push(Effect::Notify(Notification::SessionCancelled {
        grid: session.source.clone(),
        reason: reason.to_string(),
    }));
}

/// Render a layout of `grid`. With `dragged`, the item with the given id is
/// drawn as placeholder and the pointer-following rect is attached.
fn push_render(grid: &Grid, layout: &[GridItem], dragged: Option<(&str, RenderRect)>, effects: &mut Vec<Effect>) {
    let full = grid.with_excluded(layout.iter().filter(|item| !grid.is_excluded(&item.id)).cloned().collect());
    match grid.render(&full) {
        Ok(mut update) => {
            if let Some((item_id, rect)) = dragged {
                update.placeholder = update.rects.remove(item_id);
                update.dragged = Some(rect);
            }
            effects.push(Effect::Render(update));
        }
        Err(error) => {
            log::warn!("Cannot render grid {}: {error}", grid.id);
            effects.push(Effect::Notify(Notification::warning(Some(grid.id.as_str()), error)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GridConfig, is_placeholder_id};

    fn registry() -> GridRegistry {
        let mut registry = GridRegistry::new();
        let a = Grid::new("a", GridConfig::new(4), Rect::new(0.0, 0.0, 400.0, 400.0)).with_layout(vec![
            GridItem::new("1", 0, 0, 2, 2),
            GridItem::new("2", 2, 0, 2, 2),
            GridItem::new("wall", 0, 2, 1, 1).with_static(true),
        ]);
        let b = Grid::new("b", GridConfig::new(4), Rect::new(500.0, 0.0, 900.0, 400.0))
            .with_layout(vec![GridItem::new("x", 0, 0, 4, 1)])
            .with_connected_to(vec!["a".into()]);
        registry.register(a).unwrap();
        registry.register(b).unwrap();
        registry
    }

    fn ctx<'a>(registry: &'a GridRegistry, settings: &'a EngineSettings) -> TransitionContext<'a> {
        TransitionContext {
            registry,
            settings,
            session_id: Uuid::nil(),
        }
    }

    fn down(item: &str, kind: InteractionKind, x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown {
            grid: "a".into(),
            item: item.into(),
            kind,
            position: Point::new(x, y),
            timestamp: 0,
        }
    }

    fn mv(x: f64, y: f64, timestamp: u64) -> InputEvent {
        InputEvent::PointerMove {
            position: Point::new(x, y),
            timestamp,
        }
    }

    fn up(timestamp: u64) -> InputEvent {
        InputEvent::PointerUp {
            position: Point::ZERO,
            timestamp,
        }
    }

    fn notifications(effects: &[Effect]) -> Vec<&Notification> {
        effects.iter().filter_map(Effect::notification).collect()
    }

    fn run(registry: &GridRegistry, events: &[InputEvent]) -> (SessionState, Vec<Effect>) {
        let settings = EngineSettings::default();
        let ctx = ctx(registry, &settings);
        let mut state = SessionState::Idle;
        let mut all = Vec::new();
        for event in events {
            let (next, effects) = transition(state, event, &ctx);
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    #[test]
    fn test_pointer_down_starts_session() {
        let registry = registry();
        let (state, effects) = run(&registry, &[down("1", InteractionKind::Drag, 50.0, 50.0)]);
        let session = state.session().unwrap();
        assert_eq!(
            session.phase(),
            Phase::Active {
                kind: InteractionKind::Drag,
                source: "a".into()
            }
        );
        assert_eq!(session.item_start_rect, Rect::new(0.0, 0.0, 200.0, 200.0));
        assert!(matches!(notifications(&effects)[0], Notification::DragStarted { item, .. } if item.id == "1"));
    }

    #[test]
    fn test_pointer_down_on_unknown_item_warns() {
        let registry = registry();
        let (state, effects) = run(&registry, &[down("nope", InteractionKind::Drag, 0.0, 0.0)]);
        assert!(state.is_idle());
        assert_eq!(
            notifications(&effects),
            [&Notification::warning(Some("a"), GridError::UnknownItemId("nope".into()))]
        );
    }

    #[test]
    fn test_static_item_cannot_be_dragged() {
        let registry = registry();
        let (state, effects) = run(&registry, &[down("wall", InteractionKind::Drag, 10.0, 210.0)]);
        assert!(state.is_idle());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_second_pointer_down_is_ignored() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                down("2", InteractionKind::Drag, 250.0, 50.0),
            ],
        );
        assert_eq!(state.session().unwrap().item, "1");
        assert_eq!(notifications(&effects).len(), 1);
    }

    #[test]
    fn test_drag_commits_on_pointer_up() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                mv(250.0, 50.0, 30),
                up(40),
            ],
        );
        assert!(state.is_idle());
        let committed = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Commit { grid, layout } if grid == "a" => Some(layout.clone()),
                _ => None,
            })
            .unwrap();
        assert!(!crate::compact::has_overlaps(&committed));
        let moved = find_item(&committed, "1").unwrap();
        assert_eq!((moved.x, moved.y), (2, 0));
        assert!(notifications(&effects)
            .iter()
            .any(|n| matches!(n, Notification::DragEnded { grid, .. } if grid == "a")));
    }

    #[test]
    fn test_throttled_moves_apply_latest() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                mv(150.0, 50.0, 5),
                mv(250.0, 50.0, 15),
            ],
        );
        assert!(!effects.iter().skip(2).any(|e| matches!(e, Effect::Render(_))));
        let session = state.session().unwrap();
        assert_eq!(session.pointer_now, Point::new(50.0, 50.0));
        assert!(session.throttle.has_pending());

        let settings = EngineSettings::default();
        let (state, effects) = transition(state, &InputEvent::Frame { timestamp: 25 }, &ctx(&registry, &settings));
        assert_eq!(state.session().unwrap().pointer_now, Point::new(250.0, 50.0));
        assert!(effects.iter().any(|e| matches!(e, Effect::Render(_))));
    }

    #[test]
    fn test_transfer_and_drop() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                mv(560.0, 160.0, 30),
            ],
        );
        let session = state.session().unwrap();
        assert_eq!(
            session.phase(),
            Phase::TransferredTarget {
                source: "a".into(),
                target: "b".into()
            }
        );
        assert!(session.target_layout.iter().any(|item| is_placeholder_id(&item.id)));
        assert!(notifications(&effects)
            .iter()
            .any(|n| matches!(n, Notification::DragEntered { grid, source_grid, .. } if grid == "b" && source_grid == "a")));

        let settings = EngineSettings::default();
        let (state, effects) = transition(state, &up(50), &ctx(&registry, &settings));
        assert!(state.is_idle());
        let notes = notifications(&effects);
        let dropped = notes
            .iter()
            .find_map(|n| match n {
                Notification::Dropped {
                    grid,
                    source_grid,
                    layout,
                    item,
                } => Some((grid, source_grid, layout, item)),
                _ => None,
            })
            .unwrap();
        assert_eq!(dropped.0, "b");
        assert_eq!(dropped.1, "a");
        assert_eq!(dropped.3.id, "1");
        assert!(dropped.2.iter().all(|item| !is_placeholder_id(&item.id)));
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::ItemRemoved { grid, item, layout } if grid == "a" && item == "1" && find_item(layout, "1").is_none())));
        for effect in &effects {
            if let Effect::Commit { layout, .. } = effect {
                assert!(layout.iter().all(|item| !is_placeholder_id(&item.id)));
            }
        }
    }

    #[test]
    fn test_leaving_target_discards_placeholder() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                mv(560.0, 160.0, 30),
                mv(100.0, 100.0, 60),
            ],
        );
        let session = state.session().unwrap();
        assert!(session.target.is_none());
        assert!(session.target_layout.is_empty());
        assert!(notifications(&effects)
            .iter()
            .any(|n| matches!(n, Notification::DragExited { grid, .. } if grid == "b")));
    }

    #[test]
    fn test_source_destroyed_cancels() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                InputEvent::GridDestroyed { grid: "a".into() },
            ],
        );
        assert!(state.is_idle());
        assert!(!effects.iter().any(|e| matches!(e, Effect::Commit { .. })));
        assert!(notifications(&effects)
            .iter()
            .any(|n| matches!(n, Notification::SessionCancelled { grid, .. } if grid == "a")));
    }

    #[test]
    fn test_resize_reports_size() {
        let registry = registry();
        let (state, effects) = run(
            &registry,
            &[
                down("2", InteractionKind::Resize, 400.0, 200.0),
                mv(400.0, 300.0, 30),
                up(40),
            ],
        );
        assert!(state.is_idle());
        let notes = notifications(&effects);
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::ItemResized { item, height, .. } if item == "2" && *height == 300.0)));
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::ResizeEnded { item, .. } if item.h == 3)));
    }

    #[test]
    fn test_auto_scroll_near_edge() {
        let mut registry = GridRegistry::new();
        let grid = Grid::new("a", GridConfig::new(4), Rect::new(0.0, 0.0, 400.0, 400.0))
            .with_layout(vec![GridItem::new("1", 0, 0, 1, 1)])
            .with_scroll_container(Some(Rect::new(0.0, 0.0, 400.0, 300.0)));
        registry.register(grid).unwrap();
        let (state, effects) = run(
            &registry,
            &[
                down("1", InteractionKind::Drag, 50.0, 50.0),
                mv(50.0, 295.0, 30),
                InputEvent::Frame { timestamp: 40 },
                up(50),
            ],
        );
        assert!(state.is_idle());
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::ScrollBy { grid, delta } if grid == "a" && *delta == Vec2::new(0.0, 2.0)
        )));
        assert_eq!(
            effects
                .iter()
                .filter(|e| matches!(e, Effect::StopAutoScroll { .. }))
                .count(),
            1
        );
    }
}
