#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for editing clearway layouts and planning paths.

mod ascii;
mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clearway_core::{CellCoord, Command, Direction, Event};
use clearway_persistence::LayoutString;
use clearway_world::query;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ascii::RenderMode, config::EditorConfig, session::Session};

#[derive(Debug, Parser)]
#[command(name = "clearway")]
#[command(about = "Edit grid layouts and plan clearance-aware paths", long_about = None)]
struct Cli {
    /// TOML file with grid, mover and path settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Layout save file read and written by the editing commands
    #[arg(long, global = true, default_value = "layout.clwy")]
    layout: PathBuf,

    #[command(subcommand)]
    command: EditorCommand,
}

#[derive(Debug, Subcommand)]
enum EditorCommand {
    /// Write a fresh layout
    New {
        /// Close every cell instead of opening them
        #[arg(long)]
        fill: bool,
    },
    /// Flip the closed state of cells given as `x,y`
    Toggle {
        #[arg(required = true, value_parser = parse_cell)]
        cells: Vec<CellCoord>,
    },
    /// Open every cell
    Clear,
    /// Close every cell
    Fill,
    /// Print the mover's path to the goal
    Path {
        /// Mover cell as `x,y`
        #[arg(long, value_parser = parse_cell)]
        start: Option<CellCoord>,
        /// Goal cell as `x,y`
        #[arg(long, value_parser = parse_cell)]
        goal: Option<CellCoord>,
        /// Clearance the mover requires
        #[arg(long)]
        size: Option<u8>,
        /// Largest accepted distance between a fallback endpoint and the goal
        #[arg(long)]
        reach: Option<u32>,
        /// Drop cells farther than this from the goal
        #[arg(long)]
        max_distance: Option<u32>,
    },
    /// Move the mover one step per direction
    Step {
        #[arg(required = true, value_enum)]
        directions: Vec<StepDirection>,
    },
    /// Print the grid as text
    Render {
        /// Show clearance digits instead of cell states
        #[arg(long)]
        clearance: bool,
    },
    /// Print the layout as a transfer string
    Export,
    /// Replace the layout with a transfer string
    Import {
        /// String produced by `export`
        value: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StepDirection {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl From<StepDirection> for Direction {
    fn from(value: StepDirection) -> Self {
        match value {
            StepDirection::N => Direction::North,
            StepDirection::Ne => Direction::NorthEast,
            StepDirection::E => Direction::East,
            StepDirection::Se => Direction::SouthEast,
            StepDirection::S => Direction::South,
            StepDirection::Sw => Direction::SouthWest,
            StepDirection::W => Direction::West,
            StepDirection::Nw => Direction::NorthWest,
        }
    }
}

/// Entry point for the clearway command-line interface.
fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let layout = cli.layout.as_path();

    match cli.command {
        EditorCommand::New { fill } => {
            let mut session = Session::new(&config);
            if fill {
                let _ = session.execute(Command::FillAll);
            }
            session.save(layout)?;
            let side = config.grid.side;
            println!("wrote {side}x{side} layout to {}", layout.display());
        }
        EditorCommand::Toggle { cells } => {
            let mut session = Session::open(&config, layout)?;
            let mut changed = 0_usize;
            for cell in cells {
                let events = session.execute(Command::ToggleCell { cell });
                if events
                    .iter()
                    .any(|event| matches!(event, Event::CellChanged { .. }))
                {
                    changed += 1;
                } else {
                    println!("skipped {}: off the grid", format_cell(cell));
                }
            }
            session.save(layout)?;
            println!("toggled {changed} cell(s)");
        }
        EditorCommand::Clear => {
            let mut session = Session::open(&config, layout)?;
            let _ = session.execute(Command::ClearAll);
            session.save(layout)?;
            println!("opened every cell");
        }
        EditorCommand::Fill => {
            let mut session = Session::open(&config, layout)?;
            let _ = session.execute(Command::FillAll);
            session.save(layout)?;
            println!("closed every cell");
        }
        EditorCommand::Path {
            start,
            goal,
            size,
            reach,
            max_distance,
        } => {
            let mut session = Session::open(&config, layout)?;
            if let Some(cell) = start {
                if !session.place_mover(cell) {
                    println!("skipped start {}: off the grid", format_cell(cell));
                }
            }
            let mut overrides = Vec::new();
            if let Some(cell) = goal {
                overrides.push(Command::SetGoal { cell });
            }
            if let Some(size) = size {
                overrides.push(Command::SetMoverSize { size });
            }
            if let Some(reach) = reach {
                overrides.push(Command::SetMaxReach { reach });
            }
            let _ = session.execute_all(overrides);
            if let Some(max_distance) = max_distance {
                session.set_max_distance(max_distance);
            }
            print_path(&session);
        }
        EditorCommand::Step { directions } => {
            let mut session = Session::open(&config, layout)?;
            for step in directions {
                let direction = Direction::from(step);
                let events = session.execute(Command::MoveMover { direction });
                match events.iter().find_map(|event| match event {
                    Event::MoverMoved { to, .. } => Some(*to),
                    _ => None,
                }) {
                    Some(to) => println!("{step:?}: moved to {}", format_cell(to)),
                    None => println!("{step:?}: blocked"),
                }
            }
            print_path(&session);
        }
        EditorCommand::Render { clearance } => {
            let session = Session::open(&config, layout)?;
            let mode = if clearance {
                RenderMode::Clearance
            } else {
                RenderMode::Cells
            };
            print!("{}", ascii::render(session.world(), mode));
        }
        EditorCommand::Export => {
            let session = Session::open(&config, layout)?;
            let encoded = LayoutString::encode(&session.capture()?)
                .context("failed to encode layout string")?;
            println!("{encoded}");
        }
        EditorCommand::Import { value } => {
            let save = LayoutString::decode(&value).context("failed to decode layout string")?;
            let mut session = Session::new(&config);
            session.load(save)?;
            session.save(layout)?;
            println!("imported layout into {}", layout.display());
        }
    }

    Ok(())
}

fn print_path(session: &Session) {
    let world = session.world();
    let mover = query::mover(world);
    let goal = query::goal(world);
    let path = query::path(world);

    if path.is_empty() {
        println!(
            "no path from {} to {} for size {}",
            format_cell(mover.cell),
            format_cell(goal),
            mover.size
        );
        return;
    }

    let outcome = if path.reached_goal {
        "reaches goal"
    } else {
        "ends at closest reachable cell"
    };
    println!("{} cells, {outcome}", path.len());
    let route = path
        .cells
        .iter()
        .map(|&cell| format_cell(cell))
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("{route}");
}

fn format_cell(cell: CellCoord) -> String {
    format!("{},{}", cell.x(), cell.y())
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid x coordinate `{x}`: {error}"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid y coordinate `{y}`: {error}"))?;
    Ok(CellCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cells_parse_from_comma_pairs() {
        assert_eq!(parse_cell("3,4"), Ok(CellCoord::new(3, 4)));
        assert_eq!(parse_cell(" 10 , -2 "), Ok(CellCoord::new(10, -2)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("a,4").is_err());
    }

    #[test]
    fn step_directions_use_compass_names() {
        let cli = Cli::try_parse_from(["clearway", "step", "ne", "s", "w"]).expect("parses");
        let EditorCommand::Step { directions } = cli.command else {
            panic!("expected step command");
        };
        let directions: Vec<Direction> = directions.into_iter().map(Direction::from).collect();
        assert_eq!(
            directions,
            vec![Direction::NorthEast, Direction::South, Direction::West]
        );
    }

    #[test]
    fn global_options_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "clearway",
            "toggle",
            "1,2",
            "--layout",
            "custom.clwy",
            "--config",
            "editor.toml",
        ])
        .expect("parses");
        assert_eq!(cli.layout, PathBuf::from("custom.clwy"));
        assert_eq!(cli.config, Some(PathBuf::from("editor.toml")));
        assert!(matches!(
            cli.command,
            EditorCommand::Toggle { cells } if cells == vec![CellCoord::new(1, 2)]
        ));
    }

    #[test]
    fn toggled_cells_show_up_in_render() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = dir.path().join("layout.clwy");
        let layout_arg = layout.to_str().expect("utf-8 temp path");

        let toggle = Cli::try_parse_from([
            "clearway",
            "--layout",
            layout_arg,
            "toggle",
            "1,1",
            "3,0",
        ])
        .expect("parses");
        run(toggle).expect("toggle runs");

        let path = Cli::try_parse_from(["clearway", "--layout", layout_arg, "path", "--start=-4,2"])
            .expect("parses");
        run(path).expect("off-grid start is reported, not fatal");

        let session = Session::open(&EditorConfig::default(), &layout).expect("reopen");
        let text = ascii::render(session.world(), RenderMode::Cells);
        let rows: Vec<Vec<char>> = text.lines().map(|row| row.chars().collect()).collect();
        assert_eq!(rows.len(), 128);
        assert_eq!(rows[0][0], 'S');
        assert_eq!(rows[0][3], '#');
        assert_eq!(rows[1][1], '#');
        assert_eq!(rows[16][16], 'G');
        assert_eq!(text.matches('#').count(), 2);
    }

    #[test]
    fn toggle_requires_cells() {
        assert!(Cli::try_parse_from(["clearway", "toggle"]).is_err());
    }
}
