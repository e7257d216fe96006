//! Editing session that pumps commands through the world and pathfinder.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clearway_core::{CellCoord, Command, Event, PathRequest};
use clearway_persistence::{load_from_path, save_to_path, SaveFile};
use clearway_system_pathfinding::Pathfinder;
use clearway_world::{self as world, query, World};
use tracing::info;

use crate::config::EditorConfig;

/// World plus the systems that react to its events.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    pathfinder: Pathfinder,
    max_distance: u32,
}

impl Session {
    /// Creates an open grid with the mover, goal and reach taken from `config`.
    pub(crate) fn new(config: &EditorConfig) -> Self {
        let mut session = Self {
            world: World::with_config(config.grid_config()),
            pathfinder: Pathfinder::new(),
            max_distance: config.path.max_distance,
        };

        let mut events = Vec::new();
        for command in [
            Command::PlaceMover {
                cell: config.mover_start(),
            },
            Command::SetMoverSize {
                size: config.mover.size,
            },
            Command::SetGoal { cell: config.goal() },
            Command::SetMaxReach {
                reach: config.path.max_reach,
            },
        ] {
            world::apply(&mut session.world, command, &mut events);
        }
        session.refresh_path();
        session
    }

    /// Opens the layout stored at `path`, or an open grid when no file exists yet.
    pub(crate) fn open(config: &EditorConfig, path: &Path) -> Result<Self> {
        let mut session = Self::new(config);
        if !path.exists() {
            info!(path = %path.display(), "no layout file yet, starting from an open grid");
            return Ok(session);
        }

        let save = load_from_path(path)
            .with_context(|| format!("failed to load layout from {}", path.display()))?;
        session.load(save)?;
        Ok(session)
    }

    /// Overwrites the grid with a decoded layout.
    pub(crate) fn load(&mut self, save: SaveFile) -> Result<()> {
        save.check_side(query::config(&self.world).side())
            .context("layout does not match the configured grid")?;

        let events = self.execute(Command::ApplyTiles { tiles: save.tiles });
        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::TilesRejected { reason } => Some(*reason),
            _ => None,
        }) {
            bail!("world rejected layout tiles: {reason:?}");
        }
        Ok(())
    }

    /// Captures the current closed layout.
    pub(crate) fn capture(&self) -> Result<SaveFile> {
        SaveFile::capture(&query::grid_view(&self.world)).context("failed to capture layout")
    }

    /// Captures the layout and writes it atomically to `path`.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let save = self.capture()?;
        save_to_path(path, &save)
            .with_context(|| format!("failed to save layout to {}", path.display()))
    }

    /// Applies a single command and everything the systems emit in response.
    pub(crate) fn execute(&mut self, command: Command) -> Vec<Event> {
        self.execute_all(vec![command])
    }

    /// Applies commands until the systems stop reacting, returning every event raised.
    pub(crate) fn execute_all(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut raised = Vec::new();
        let mut pending = commands;

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            let request = self.path_request();
            self.pathfinder.handle(
                &events,
                query::grid_view(&self.world),
                &request,
                &mut pending,
            );
            raised.extend(events);
        }

        raised
    }

    /// Moves the mover onto `cell`. Returns `false` when the cell lies off the grid.
    pub(crate) fn place_mover(&mut self, cell: CellCoord) -> bool {
        if !query::grid_view(&self.world).in_bounds(cell) {
            return false;
        }
        let _ = self.execute(Command::PlaceMover { cell });
        true
    }

    /// Limits how far from the goal the search may wander and replans.
    pub(crate) fn set_max_distance(&mut self, max_distance: u32) {
        self.max_distance = max_distance;
        self.refresh_path();
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    fn path_request(&self) -> PathRequest {
        query::path_request(&self.world).with_max_distance(self.max_distance)
    }

    fn refresh_path(&mut self) {
        let request = self.path_request();
        let path = self
            .pathfinder
            .search(query::grid_view(&self.world), &request);
        let _ = self.execute(Command::SetPath { path });
    }
}
