//! Single-threaded dispatch loop shared by all grids.

use crate::effect::{Effect, Notification};
use crate::error::{GridError, GridResult};
use crate::input::{EventQueue, InputEvent};
use crate::model::{GridConfig, Layout};
use crate::registry::{Grid, GridRegistry};
use crate::session::{EngineSettings, SessionState, TransitionContext, transition};
use kurbo::Rect;
use uuid::Uuid;

/// Owns the grids, the pending input and the (single) interaction session.
///
/// Hosts push [`InputEvent`]s and drain the resulting [`Effect`]s. `Commit`
/// effects are applied to the registry before they are returned.
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: GridRegistry,
    settings: EngineSettings,
    state: SessionState,
    queue: EventQueue,
}

impl Dispatcher {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &GridRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Committed layout of a grid.
    pub fn layout(&self, grid: &str) -> GridResult<&Layout> {
        Ok(&self.registry.get(grid)?.layout)
    }

    /// Add a grid and render it.
    pub fn register_grid(&mut self, grid: Grid) -> GridResult<Vec<Effect>> {
        let id = grid.id.clone();
        let warnings = self.registry.register(grid)?;
        Ok(self.after_registry_change(&id, warnings))
    }

    /// Remove a grid. A session depending on it is cancelled or returned to
    /// its source grid.
    pub fn unregister_grid(&mut self, grid: &str) -> Vec<Effect> {
        self.handle(InputEvent::GridDestroyed { grid: grid.to_string() })
    }

    /// Replace a grid's layout.
    pub fn set_layout(&mut self, grid: &str, layout: Layout) -> GridResult<Vec<Effect>> {
        self.warn_if_busy(grid);
        let warnings = self.registry.set_layout(grid, layout)?;
        Ok(self.after_registry_change(grid, warnings))
    }

    /// Replace a grid's configuration.
    pub fn set_config(&mut self, grid: &str, config: GridConfig) -> GridResult<Vec<Effect>> {
        self.warn_if_busy(grid);
        let warnings = self.registry.set_config(grid, config)?;
        Ok(self.after_registry_change(grid, warnings))
    }

    /// Move or resize a grid.
    pub fn resize_grid(&mut self, grid: &str, rect: Rect) -> Vec<Effect> {
        self.handle(InputEvent::GridResized {
            grid: grid.to_string(),
            rect,
        })
    }

    /// Queue an event. Consecutive moves and scrolls coalesce.
    pub fn push(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Process every queued event in order.
    pub fn dispatch(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some(event) = self.queue.pop() {
            effects.extend(self.handle(event));
        }
        effects
    }

    /// Process one event immediately.
    pub fn handle(&mut self, event: InputEvent) -> Vec<Effect> {
        if let InputEvent::GridResized { grid, rect } = &event {
            if let Err(error) = self.registry.set_rect(grid, *rect) {
                return vec![Effect::Notify(Notification::warning(Some(grid.as_str()), error))];
            }
        }

        let ctx = TransitionContext {
            registry: &self.registry,
            settings: &self.settings,
            session_id: Uuid::new_v4(),
        };
        let state = std::mem::take(&mut self.state);
        let (state, effects) = transition(state, &event, &ctx);
        self.state = state;

        if let InputEvent::GridDestroyed { grid } = &event {
            self.registry.unregister(grid);
        }
        self.apply(effects)
    }

    fn apply(&mut self, mut effects: Vec<Effect>) -> Vec<Effect> {
        for effect in &mut effects {
            if let Effect::Commit { grid, layout } = effect {
                if let Err(error) = self.registry.commit(grid, layout.clone()) {
                    log::warn!("Dropping commit for grid {grid}: {error}");
                    *effect = Effect::Notify(Notification::warning(Some(grid.as_str()), error));
                }
            }
        }
        effects
    }

    fn warn_if_busy(&self, grid: &str) {
        if let Some(session) = self.state.session() {
            if session.source == grid || session.target.as_deref() == Some(grid) {
                log::warn!("Grid {grid} changed during session {}; the drop will overwrite it", session.id);
            }
        }
    }

    fn after_registry_change(&self, grid: &str, warnings: Vec<GridError>) -> Vec<Effect> {
        let mut effects: Vec<Effect> = warnings
            .into_iter()
            .map(|error| Effect::Notify(Notification::warning(Some(grid), error)))
            .collect();
        if let Ok(grid) = self.registry.get(grid) {
            match grid.render_committed() {
                Ok(update) => effects.push(Effect::Render(update)),
                Err(error) => effects.push(Effect::Notify(Notification::warning(Some(grid.id.as_str()), error))),
            }
            effects.push(Effect::Notify(Notification::LayoutUpdated {
                grid: grid.id.clone(),
                layout: grid.layout.clone(),
            }));
        }
        effects
    }
}
