//! Replays a JSON scenario against the grid engine and prints what happens.

mod replay;
mod scenario;

use clap::Parser;
use replay::Replay;
use scenario::Scenario;
use serde::Serialize;
use std::path::PathBuf;
use tilegrid_core::{Effect, Layout, Notification};

#[derive(Parser)]
#[command(name = "tilegrid-replay", version, about = "Replay pointer input against tilegrid layouts")]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,
    /// Print every effect, not only notifications.
    #[arg(long)]
    effects: bool,
    /// Print only the final layouts.
    #[arg(long, short)]
    quiet: bool,
    /// Pretty-print the final layouts.
    #[arg(long)]
    pretty: bool,
    /// Device pixel ratio used when presenting renders.
    #[arg(long, default_value_t = 1.0)]
    scale_factor: f64,
    /// Print what the surface shows for every grid at the end.
    #[arg(long)]
    frames: bool,
    /// Fail on layouts that would need repairing instead of repairing them.
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct FinalLayout<'a> {
    grid: &'a str,
    layout: &'a Layout,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameSummary<'a> {
    grid: &'a str,
    container_height: f64,
    items: Vec<(&'a str, [f64; 4])>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let scenario = Scenario::load(&cli.scenario)?;
    if cli.strict {
        scenario.check_layouts()?;
    }
    log::info!(
        "Loaded {} grids and {} events from {}",
        scenario.grids.len(),
        scenario.events.len(),
        cli.scenario.display()
    );

    let (mut replay, initial) = Replay::new(&scenario, cli.scale_factor)?;
    let mut effects = initial;
    effects.extend(replay.run(&scenario.events));

    if !cli.quiet {
        for effect in &effects {
            if cli.effects {
                println!("{}", serde_json::to_string(effect)?);
            } else if let Some(notification) = effect.notification() {
                println!("{}", serde_json::to_string(notification)?);
            }
        }
    }

    for grid in replay.dispatcher().registry().iter() {
        let out = FinalLayout {
            grid: &grid.id,
            layout: &grid.layout,
        };
        if cli.pretty {
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", serde_json::to_string(&out)?);
        }
    }

    if cli.frames {
        for (grid, frame) in replay.surface().frames() {
            let summary = FrameSummary {
                grid,
                container_height: frame.container_height,
                items: frame
                    .items
                    .iter()
                    .map(|(id, placed)| {
                        let r = placed.rect;
                        (id.as_str(), [r.x0, r.y0, r.width(), r.height()])
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string(&summary)?);
        }
    }

    if !replay.dispatcher().is_idle() {
        log::warn!("Scenario ended with an interaction still in progress");
    }
    let warnings = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Notify(Notification::Warning { .. })))
        .count();
    if warnings > 0 {
        log::warn!("{warnings} warnings reported");
    }
    Ok(())
}
