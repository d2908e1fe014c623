//! Scenario files: grids to register and the input script to replay.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tilegrid_core::{EngineSettings, Grid, GridError, GridResult, InputEvent, validate_layout};

/// A replayable interaction script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub settings: EngineSettings,
    pub grids: Vec<Grid>,
    #[serde(default)]
    pub events: Vec<InputEvent>,
}

impl Scenario {
    /// Parse a scenario from JSON text and validate it.
    pub fn from_json(json: &str) -> GridResult<Self> {
        let scenario: Scenario =
            serde_json::from_str(json).map_err(|err| GridError::InvalidScenario(err.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read a scenario file.
    pub fn load(path: &Path) -> GridResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| GridError::InvalidScenario(format!("{}: {err}", path.display())))?;
        Self::from_json(&json)
    }

    /// Check the parts of a scenario the engine would otherwise accept
    /// silently.
    pub fn validate(&self) -> GridResult<()> {
        if self.grids.is_empty() {
            return Err(GridError::InvalidScenario("no grids".into()));
        }

        let mut ids = HashSet::new();
        for grid in &self.grids {
            if !ids.insert(grid.id.as_str()) {
                return Err(GridError::DuplicateGrid(grid.id.clone()));
            }
        }
        for grid in &self.grids {
            if let Some(missing) = grid.connected_to.iter().find(|id| !ids.contains(id.as_str())) {
                return Err(GridError::InvalidScenario(format!(
                    "grid {} is connected to unknown grid {missing}",
                    grid.id
                )));
            }
        }

        let mut last = 0;
        for (index, event) in self.events.iter().enumerate() {
            let Some(timestamp) = event.timestamp() else {
                continue;
            };
            if timestamp < last {
                return Err(GridError::InvalidScenario(format!(
                    "event {index} goes back in time ({timestamp} < {last})"
                )));
            }
            last = timestamp;
        }
        Ok(())
    }

    /// Reject layouts the engine would otherwise repair on registration.
    pub fn check_layouts(&self) -> GridResult<()> {
        for grid in &self.grids {
            validate_layout(&grid.layout, &grid.config)?;
        }
        Ok(())
    }
}
