//! Error types shared by the layout engine and the interaction state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the grid engine.
///
/// Geometry problems are usually recovered locally (clamping, fallbacks) and
/// only surfaced as warnings; structural problems such as an unknown item id
/// during a session abort that session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GridError {
    #[error("Invalid bounds for item {id}: {reason}")]
    InvalidItemBounds { id: String, reason: String },
    #[error("Unknown item id: {0}")]
    UnknownItemId(String),
    #[error("Displacement cycle detected at item {0}")]
    DisplacementCycle(String),
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),
    #[error("Unknown grid: {0}")]
    UnknownGrid(String),
    #[error("Grid already registered: {0}")]
    DuplicateGrid(String),
    #[error("Duplicate item id: {0}")]
    DuplicateItemId(String),
    #[error("Item id is inside the reserved placeholder namespace: {0}")]
    ReservedItemId(String),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

impl GridError {
    pub(crate) fn bounds(id: &str, reason: impl Into<String>) -> Self {
        GridError::InvalidItemBounds {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the current interaction session.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, GridError::UnknownItemId(_) | GridError::UnknownGrid(_))
    }
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
