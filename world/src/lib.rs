#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid editor state for clearway.
//!
//! The world owns the cell grid, keeps the clearance field in step with every
//! edit, and tracks the mover, its goal, and the most recently planned path.
//! All mutations flow through [`apply`]; adapters and systems read state via
//! the [`query`] module.

mod clearance;
mod grid;

use clearway_core::{
    CellCoord, CellRect, Command, Direction, Event, GridConfig, Path, TileRecord, TileRejection,
};
use tracing::{debug, info, warn};

use crate::{clearance::ClearanceField, grid::Grid};

const DEFAULT_GOAL: CellCoord = CellCoord::new(16, 16);
const DEFAULT_MOVER_SIZE: u8 = 1;

/// Snapshot of the controllable mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mover {
    /// Cell currently occupied by the mover.
    pub cell: CellCoord,
    /// Clearance the mover requires to enter a cell.
    pub size: u8,
}

/// Represents the authoritative editor world.
#[derive(Debug)]
pub struct World {
    config: GridConfig,
    grid: Grid,
    clearance: ClearanceField,
    mover: Mover,
    goal: CellCoord,
    max_reach: u32,
    path: Path,
}

impl World {
    /// Creates a world using the default grid configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GridConfig::default())
    }

    /// Creates an open world sized by the provided configuration.
    ///
    /// The configuration should already have passed [`GridConfig::validate`];
    /// a zero clearance clamp is raised to one so mover sizes stay meaningful.
    #[must_use]
    pub fn with_config(config: GridConfig) -> Self {
        let config = GridConfig::new(config.side(), config.max_clearance().max(1));
        let mut grid = Grid::new(config.side(), config.max_clearance());
        let clearance = ClearanceField::new(config.max_clearance());
        let _ = clearance.recompute_all(&mut grid);

        let last = i32::try_from(config.side().saturating_sub(1)).unwrap_or(i32::MAX);
        let goal = CellCoord::new(DEFAULT_GOAL.x().min(last), DEFAULT_GOAL.y().min(last));

        Self {
            config,
            grid,
            clearance,
            mover: Mover {
                cell: CellCoord::default(),
                size: DEFAULT_MOVER_SIZE,
            },
            goal,
            max_reach: 0,
            path: Path::empty(),
        }
    }

    fn set_closed(&mut self, cell: CellCoord, closed: bool, out_events: &mut Vec<Event>) {
        if !self.grid.set_closed(cell, closed) {
            return;
        }
        out_events.push(Event::CellChanged { cell, closed });

        let window = edit_region(self, cell);
        let region = self.clearance.recompute_region(&mut self.grid, window);
        debug!(x = cell.x(), y = cell.y(), closed, "recomputed clearance around edit");
        out_events.push(Event::ClearanceRecomputed { region });
    }

    fn reset(&mut self, closed: bool, out_events: &mut Vec<Event>) {
        if closed {
            self.grid.fill_all();
        } else {
            self.grid.clear_all();
        }
        let region = self.clearance.recompute_all(&mut self.grid);
        info!(closed, side = self.config.side(), "reset every cell");
        out_events.push(Event::GridReset { closed });
        out_events.push(Event::ClearanceRecomputed { region });
    }

    fn apply_tiles(&mut self, tiles: &[TileRecord], out_events: &mut Vec<Event>) {
        if let Err(reason) = self.check_tiles(tiles) {
            warn!(?reason, count = tiles.len(), "rejected tile batch");
            out_events.push(Event::TilesRejected { reason });
            return;
        }

        for tile in tiles {
            for (cell, closed) in tile.cells() {
                let _ = self.grid.set_closed(cell, closed);
            }
        }
        let region = self.clearance.recompute_all(&mut self.grid);
        info!(count = tiles.len(), "applied persisted tiles");
        out_events.push(Event::TilesApplied { count: tiles.len() });
        out_events.push(Event::ClearanceRecomputed { region });
    }

    fn check_tiles(&self, tiles: &[TileRecord]) -> Result<(), TileRejection> {
        let side = self.config.side();
        if !self.config.supports_tiles() {
            return Err(TileRejection::UnsupportedGridSide { side });
        }
        match tiles.iter().find(|tile| !tile.fits(side)) {
            Some(tile) => Err(TileRejection::TileOutOfBounds {
                tile_x: tile.tile_x,
                tile_y: tile.tile_y,
            }),
            None => Ok(()),
        }
    }

    fn move_mover(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let step = slide_step(&self.grid, self.mover, direction);
        if step == CellCoord::default() {
            out_events.push(Event::MoverBlocked { direction });
            return;
        }

        let from = self.mover.cell;
        let to = from + step;
        self.mover.cell = to;
        out_events.push(Event::MoverMoved { from, to });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the step actually taken when the mover pushes in `direction`.
///
/// A blocked diagonal collapses onto whichever axis stays open, and a step
/// into an obstacle slides along an open axis instead. A zero offset means the
/// mover cannot move at all.
fn slide_step(grid: &Grid, mover: Mover, direction: Direction) -> CellCoord {
    let view = grid.view();
    let open = |cell: CellCoord| view.traversable(cell, mover.size);

    let origin = mover.cell;
    let offset = direction.offset();
    let (mut dx, mut dy) = (offset.x(), offset.y());

    let mut ok = open(origin + offset);

    if ok && direction.is_diagonal() {
        if !open(CellCoord::new(origin.x() + dx, origin.y())) {
            dx = 0;
        }
        if !open(CellCoord::new(origin.x(), origin.y() + dy)) {
            dy = 0;
        }
    }

    if !ok && open(CellCoord::new(origin.x() + dx, origin.y())) {
        ok = true;
        dy = 0;
    }

    if !ok && open(CellCoord::new(origin.x(), origin.y() + dy)) {
        ok = true;
        dx = 0;
    }

    if ok {
        CellCoord::new(dx, dy)
    } else {
        CellCoord::default()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ToggleCell { cell } => {
            if let Some(current) = world.grid.cell_at(cell) {
                let closed = !current.closed;
                world.set_closed(cell, closed, out_events);
            }
        }
        Command::SetCellClosed { cell, closed } => {
            world.set_closed(cell, closed, out_events);
        }
        Command::ClearAll => world.reset(false, out_events),
        Command::FillAll => world.reset(true, out_events),
        Command::ApplyTiles { tiles } => world.apply_tiles(&tiles, out_events),
        Command::SetGoal { cell } => {
            if world.goal != cell {
                world.goal = cell;
                out_events.push(Event::GoalChanged { cell });
            }
        }
        Command::SetMoverSize { size } => {
            let size = size.clamp(1, world.config.max_clearance());
            if world.mover.size != size {
                world.mover.size = size;
                out_events.push(Event::MoverSizeChanged { size });
            }
        }
        Command::SetMaxReach { reach } => {
            if world.max_reach != reach {
                world.max_reach = reach;
                out_events.push(Event::MaxReachChanged { reach });
            }
        }
        Command::PlaceMover { cell } => {
            if world.grid.in_bounds(cell) && world.mover.cell != cell {
                let from = world.mover.cell;
                world.mover.cell = cell;
                out_events.push(Event::MoverMoved { from, to: cell });
            }
        }
        Command::MoveMover { direction } => world.move_mover(direction, out_events),
        Command::SetPath { path } => {
            let reached_goal = path.reached_goal;
            let length = path.len();
            world.path = path;
            out_events.push(Event::PathUpdated {
                reached_goal,
                length,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use clearway_core::{Cell, CellCoord, GridConfig, GridView, Path, PathRequest};

    use super::{Mover, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> GridConfig {
        world.config
    }

    /// Exposes a read-only view of the dense cell grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Returns the cell at the coordinate, or `None` when it lies off the grid.
    #[must_use]
    pub fn cell_at(world: &World, cell: CellCoord) -> Option<&Cell> {
        world.grid.cell_at(cell)
    }

    /// Snapshot of the controllable mover.
    #[must_use]
    pub fn mover(world: &World) -> Mover {
        world.mover
    }

    /// Goal the mover navigates toward.
    #[must_use]
    pub fn goal(world: &World) -> CellCoord {
        world.goal
    }

    /// Largest accepted distance between a fallback endpoint and the goal.
    #[must_use]
    pub fn max_reach(world: &World) -> u32 {
        world.max_reach
    }

    /// Most recently stored path.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Path query describing the mover's current route to the goal.
    #[must_use]
    pub fn path_request(world: &World) -> PathRequest {
        PathRequest::new(world.mover.cell, world.goal, world.mover.size)
            .with_max_reach(world.max_reach)
    }

    /// Largest clearance value tracked by the world.
    #[must_use]
    pub fn max_clearance(world: &World) -> u8 {
        world.grid.max_clearance()
    }
}

/// Region refreshed after the closed state of `cell` changes.
///
/// Edits only influence cells within the clearance clamp, so a square of
/// `2 * max_clearance + 1` cells around the edit suffices.
#[must_use]
pub fn edit_region(world: &World, cell: CellCoord) -> CellRect {
    world
        .clearance
        .influence(cell)
        .clamp_to(world.config.side())
}
