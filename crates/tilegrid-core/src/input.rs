//! Platform-neutral input events, pointer throttling and the event queue.

use crate::model::{GridId, ItemId};
use crate::simulate::InteractionKind;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default minimal interval between two applied pointer moves.
pub const DEFAULT_THROTTLE_MS: u64 = 20;

/// Input delivered to the dispatcher. Timestamps are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer pressed on an item (or its resize handle).
    PointerDown {
        grid: GridId,
        item: ItemId,
        kind: InteractionKind,
        position: Point,
        timestamp: u64,
    },
    PointerMove {
        position: Point,
        timestamp: u64,
    },
    PointerUp {
        position: Point,
        timestamp: u64,
    },
    PointerCancel {
        timestamp: u64,
    },
    /// Scroll offset of the scroll container, accumulated since the session started.
    Scroll {
        offset: Vec2,
        timestamp: u64,
    },
    /// Animation frame.
    Frame {
        timestamp: u64,
    },
    GridDestroyed {
        grid: GridId,
    },
    /// New client rect of a grid.
    GridResized {
        grid: GridId,
        rect: Rect,
    },
}

impl InputEvent {
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            InputEvent::PointerDown { timestamp, .. }
            | InputEvent::PointerMove { timestamp, .. }
            | InputEvent::PointerUp { timestamp, .. }
            | InputEvent::PointerCancel { timestamp }
            | InputEvent::Scroll { timestamp, .. }
            | InputEvent::Frame { timestamp } => Some(*timestamp),
            InputEvent::GridDestroyed { .. } | InputEvent::GridResized { .. } => None,
        }
    }

    /// Whether a queued event of this kind may be replaced by a newer one.
    fn coalesces_with(&self, newer: &InputEvent) -> bool {
        matches!(
            (self, newer),
            (InputEvent::PointerMove { .. }, InputEvent::PointerMove { .. })
                | (InputEvent::Scroll { .. }, InputEvent::Scroll { .. })
        )
    }
}

/// FIFO of pending input. Consecutive pointer moves (and consecutive scroll
/// updates) collapse to the most recent one.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        if let Some(last) = self.events.back_mut() {
            if last.coalesces_with(&event) {
                *last = event;
                return;
            }
        }
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Throttle for pointer moves.
///
/// A move is applied when at least `interval_ms` passed since the last applied
/// one; otherwise it is kept as pending, replacing any older pending sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TickThrottle {
    interval_ms: u64,
    last_applied: u64,
    pending: Option<Point>,
}

impl TickThrottle {
    /// Start a throttle window at `timestamp`.
    pub fn new(interval_ms: u64, timestamp: u64) -> Self {
        Self {
            interval_ms,
            last_applied: timestamp,
            pending: None,
        }
    }

    fn elapsed(&self, timestamp: u64) -> bool {
        timestamp.saturating_sub(self.last_applied) >= self.interval_ms
    }

    /// Offer a pointer sample. Returns the sample when it should be applied now.
    pub fn offer(&mut self, position: Point, timestamp: u64) -> Option<Point> {
        if self.elapsed(timestamp) {
            self.last_applied = timestamp;
            self.pending = None;
            Some(position)
        } else {
            self.pending = Some(position);
            None
        }
    }

    /// Release the pending sample once the interval has passed.
    pub fn flush(&mut self, timestamp: u64) -> Option<Point> {
        if self.pending.is_some() && self.elapsed(timestamp) {
            self.last_applied = timestamp;
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the pending sample regardless of time.
    pub fn take_pending(&mut self) -> Option<Point> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
