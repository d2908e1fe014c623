//! Headless host that drives a dispatcher from a scenario.

use crate::scenario::Scenario;
use kurbo::Vec2;
use tilegrid_core::{Dispatcher, Effect, GridResult, InputEvent};
use tilegrid_render::{RecordingSurface, RenderContext, apply_update};

/// Plays the role of the page around the grids: presents render updates on
/// a [`RecordingSurface`] and feeds auto-scroll back as scroll events.
pub struct Replay {
    dispatcher: Dispatcher,
    surface: RecordingSurface,
    scale_factor: f64,
    /// Scroll offset accumulated since the current session started.
    scrolled: Vec2,
    /// Latest timestamp seen in the script.
    clock: u64,
}

impl Replay {
    /// Register the scenario's grids. Returns the host and the effects of
    /// the initial renders.
    pub fn new(scenario: &Scenario, scale_factor: f64) -> GridResult<(Self, Vec<Effect>)> {
        let mut replay = Self {
            dispatcher: Dispatcher::new(scenario.settings.clone()),
            surface: RecordingSurface::new(),
            scale_factor,
            scrolled: Vec2::ZERO,
            clock: 0,
        };
        let mut effects = Vec::new();
        for grid in &scenario.grids {
            effects.extend(replay.dispatcher.register_grid(grid.clone())?);
        }
        replay.present(&effects);
        Ok((replay, effects))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    /// Replay a whole script. Events are queued and drained at every frame
    /// and at pointer release, the way a browser batches input.
    pub fn run(&mut self, events: &[InputEvent]) -> Vec<Effect> {
        let mut effects = Vec::new();
        for event in events {
            let flush = matches!(
                event,
                InputEvent::Frame { .. } | InputEvent::PointerUp { .. } | InputEvent::PointerCancel { .. }
            );
            self.push(event.clone());
            if flush {
                effects.extend(self.drain());
            }
        }
        effects.extend(self.drain());
        effects
    }

    fn push(&mut self, event: InputEvent) {
        if let Some(timestamp) = event.timestamp() {
            self.clock = self.clock.max(timestamp);
        }
        if matches!(event, InputEvent::PointerDown { .. }) {
            self.scrolled = Vec2::ZERO;
        }
        if let InputEvent::GridDestroyed { grid } = &event {
            self.surface.forget(grid);
        }
        self.dispatcher.push(event);
    }

    /// Dispatch until no host feedback is pending.
    fn drain(&mut self) -> Vec<Effect> {
        let mut all = Vec::new();
        loop {
            let effects = self.dispatcher.dispatch();
            if effects.is_empty() {
                break;
            }
            self.present(&effects);
            let mut scrolled = false;
            for effect in &effects {
                if let Effect::ScrollBy { delta, .. } = effect {
                    self.scrolled += *delta;
                    scrolled = true;
                }
            }
            all.extend(effects);
            if !scrolled {
                break;
            }
            self.dispatcher.push(InputEvent::Scroll {
                offset: self.scrolled,
                timestamp: self.clock,
            });
        }
        all
    }

    fn present(&mut self, effects: &[Effect]) {
        for effect in effects {
            if let Effect::Render(update) = effect {
                let ctx = RenderContext::new(update).with_scale_factor(self.scale_factor);
                if let Err(err) = apply_update(&mut self.surface, &ctx) {
                    log::warn!("Failed to present grid {}: {err}", update.grid);
                }
            }
        }
    }
}
