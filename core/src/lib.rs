#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the clearway grid editor.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired edits, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems read the grid through a borrowed
//! [`GridView`] and respond exclusively with new command batches.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Side length of the grid used when no configuration overrides it.
pub const DEFAULT_GRID_SIDE: u32 = 128;

/// Largest clearance value tracked per cell when no configuration overrides it.
pub const DEFAULT_MAX_CLEARANCE: u8 = 15;

/// Number of cells along each edge of a persisted tile.
pub const TILE_SIDE: u32 = 8;

/// Location of a single grid cell.
///
/// Coordinates are signed so neighbours that fall off the grid can still be
/// expressed; the grid treats every such coordinate as a permanent wall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Component-wise sum of two coordinates.
    #[must_use]
    pub const fn add(self, other: CellCoord) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Neighbouring coordinate one step in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        self.add(direction.offset())
    }

    /// Squared Euclidean distance between two coordinates.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> i64 {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dy = i64::from(other.y) - i64::from(self.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance rounded to the nearest integer, ties away from zero.
    #[must_use]
    pub fn rounded_distance(self, other: CellCoord) -> u32 {
        rounded_sqrt(self.distance_squared(other))
    }
}

impl Add for CellCoord {
    type Output = CellCoord;

    fn add(self, rhs: CellCoord) -> CellCoord {
        CellCoord::add(self, rhs)
    }
}

fn rounded_sqrt(value: i64) -> u32 {
    (value as f64).sqrt().round() as u32
}

/// The eight grid directions in clockwise ring order starting at north-west.
///
/// Rotation is addition modulo eight over this ordering, which keeps every
/// diagonal on an even index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Up and to the left.
    NorthWest,
    /// Toward decreasing row indices.
    North,
    /// Up and to the right.
    NorthEast,
    /// Toward increasing column indices.
    East,
    /// Down and to the right.
    SouthEast,
    /// Toward increasing row indices.
    South,
    /// Down and to the left.
    SouthWest,
    /// Toward decreasing column indices.
    West,
}

const RING: [Direction; 8] = [
    Direction::NorthWest,
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
];

const OFFSETS: [CellCoord; 8] = [
    CellCoord::new(-1, -1),
    CellCoord::new(0, -1),
    CellCoord::new(1, -1),
    CellCoord::new(1, 0),
    CellCoord::new(1, 1),
    CellCoord::new(0, 1),
    CellCoord::new(-1, 1),
    CellCoord::new(-1, 0),
];

impl Direction {
    /// Expansion order used by the pathfinder: cardinals first, then diagonals.
    pub const SEARCH_ORDER: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Unit offset travelled by a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> CellCoord {
        OFFSETS[self.index()]
    }

    /// Next direction clockwise around the ring.
    #[must_use]
    pub const fn rotate_cw(self) -> Self {
        RING[(self.index() + 1) & 0b111]
    }

    /// Next direction counter-clockwise around the ring.
    #[must_use]
    pub const fn rotate_ccw(self) -> Self {
        RING[(self.index() + 7) & 0b111]
    }

    /// Reports whether the direction moves along both axes at once.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        self.index() & 1 == 0
    }
}

/// Terrain state and derived clearance of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Marks the cell as non-traversable terrain.
    pub closed: bool,
    /// Clamped distance to the nearest closed cell or the grid boundary.
    pub space: u8,
}

impl Cell {
    /// Reports whether a mover that needs `min_space` clearance may enter the cell.
    #[must_use]
    pub const fn traversable(&self, min_space: u8) -> bool {
        !self.closed && self.space >= min_space
    }
}

/// Half-open rectangle of cells covering `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl CellRect {
    /// Creates a rectangle from its inclusive lower and exclusive upper corners.
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering every cell of a grid with the provided side length.
    #[must_use]
    pub fn covering(side: u32) -> Self {
        let side = i32::try_from(side).unwrap_or(i32::MAX);
        Self::new(0, 0, side, side)
    }

    /// Square of `2 * radius + 1` cells centred on `center`.
    #[must_use]
    pub fn around(center: CellCoord, radius: u32) -> Self {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        Self::new(
            center.x().saturating_sub(radius),
            center.y().saturating_sub(radius),
            center.x().saturating_add(radius).saturating_add(1),
            center.y().saturating_add(radius).saturating_add(1),
        )
    }

    /// Intersects the rectangle with a grid of the provided side length.
    #[must_use]
    pub fn clamp_to(self, side: u32) -> Self {
        let side = i32::try_from(side).unwrap_or(i32::MAX);
        let x0 = self.x0.clamp(0, side);
        let y0 = self.y0.clamp(0, side);
        Self::new(
            x0,
            y0,
            self.x1.clamp(x0, side),
            self.y1.clamp(y0, side),
        )
    }

    /// Reports whether the rectangle covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Iterates the covered cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| CellCoord::new(x, y)))
    }
}

/// Dimensions of the grid and the clamp applied to clearance values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    side: u32,
    max_clearance: u8,
}

impl GridConfig {
    /// Creates a configuration with explicit values.
    #[must_use]
    pub const fn new(side: u32, max_clearance: u8) -> Self {
        Self {
            side,
            max_clearance,
        }
    }

    /// Number of cells along each edge of the square grid.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Largest clearance value a cell can hold.
    #[must_use]
    pub const fn max_clearance(&self) -> u8 {
        self.max_clearance
    }

    /// Reports whether the grid can be partitioned into persisted tiles.
    #[must_use]
    pub const fn supports_tiles(&self) -> bool {
        self.side % TILE_SIDE == 0
    }

    /// Checks that the configuration describes a usable grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if i32::try_from(self.side).is_err() {
            return Err(ConfigError::GridTooLarge(self.side));
        }
        if self.max_clearance == 0 {
            return Err(ConfigError::ZeroClearance);
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIDE, DEFAULT_MAX_CLEARANCE)
    }
}

/// Reasons a [`GridConfig`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The grid side length was zero.
    EmptyGrid,
    /// The grid side length does not fit into signed cell coordinates.
    GridTooLarge(u32),
    /// The clearance clamp was zero, leaving no room for mover sizes.
    ZeroClearance,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid side length must be positive"),
            Self::GridTooLarge(side) => write!(f, "grid side length {side} is too large"),
            Self::ZeroClearance => write!(f, "maximum clearance must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parameters of a single path query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathRequest {
    /// Cell the mover currently occupies.
    pub start: CellCoord,
    /// Cell the mover wants to reach.
    pub goal: CellCoord,
    /// Minimum clearance required for every entered cell.
    pub min_space: u8,
    /// Cells farther than this from the goal are dropped from the search; zero disables it.
    pub max_distance: u32,
    /// Largest accepted distance between a fallback endpoint and the goal; zero disables fallbacks.
    pub max_reach: u32,
}

impl PathRequest {
    /// Creates a request with no distance cutoff and no fallback.
    #[must_use]
    pub const fn new(start: CellCoord, goal: CellCoord, min_space: u8) -> Self {
        Self {
            start,
            goal,
            min_space,
            max_distance: 0,
            max_reach: 0,
        }
    }

    /// Overrides the exploration cutoff.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Overrides the fallback reach.
    #[must_use]
    pub const fn with_max_reach(mut self, max_reach: u32) -> Self {
        self.max_reach = max_reach;
        self
    }
}

/// Route produced by the pathfinder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    /// Cells from the start (inclusive) to the endpoint (inclusive).
    pub cells: Vec<CellCoord>,
    /// Indicates whether the endpoint is the requested goal.
    pub reached_goal: bool,
}

impl Path {
    /// Path signalling that neither the goal nor a fallback was reachable.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: Vec::new(),
            reached_goal: false,
        }
    }

    /// Reports whether the path contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells on the path, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Final cell of the path, if any.
    #[must_use]
    pub fn end(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }
}

/// Read-only view over the dense cell grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [Cell],
    side: u32,
    max_clearance: u8,
}

impl<'a> GridView<'a> {
    /// Captures a new view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [Cell], side: u32, max_clearance: u8) -> Self {
        Self {
            cells,
            side,
            max_clearance,
        }
    }

    /// Number of cells along each edge of the grid.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Largest clearance value a cell can hold.
    #[must_use]
    pub const fn max_clearance(&self) -> u8 {
        self.max_clearance
    }

    /// Reports whether the coordinate lies on the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Returns the cell at the coordinate, or `None` when it lies off the grid.
    #[must_use]
    pub fn cell_at(&self, cell: CellCoord) -> Option<&'a Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Reports whether the coordinate blocks movement and bounds clearance.
    ///
    /// Off-grid coordinates always count as obstacles.
    #[must_use]
    pub fn is_obstacle(&self, cell: CellCoord) -> bool {
        self.cell_at(cell).map_or(true, |cell| cell.closed)
    }

    /// Reports whether a mover needing `min_space` clearance may enter the coordinate.
    #[must_use]
    pub fn traversable(&self, cell: CellCoord, min_space: u8) -> bool {
        self.cell_at(cell)
            .map_or(false, |cell| cell.traversable(min_space))
    }

    /// Iterates every cell with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &'a Cell)> + 'a {
        let side = self.side;
        let cells = self.cells;
        cells.iter().enumerate().map(move |(index, cell)| {
            let side = side.max(1) as usize;
            let x = (index % side) as i32;
            let y = (index / side) as i32;
            (CellCoord::new(x, y), cell)
        })
    }

    /// Flat row-major index of the coordinate, if it lies on the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x >= self.side || y >= self.side {
            return None;
        }
        let side = usize::try_from(self.side).ok()?;
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        y.checked_mul(side)?.checked_add(x)
    }
}

/// Closed-cell bitmask of one 8x8 tile, the unit of persisted layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRecord {
    /// Tile column, measured in whole tiles.
    pub tile_x: u32,
    /// Tile row, measured in whole tiles.
    pub tile_y: u32,
    /// Closed flags packed with the tile's first cell in the highest bit.
    pub closed_bits: u64,
}

impl TileRecord {
    /// Packs the closed flags of the tile at `(tile_x, tile_y)`.
    ///
    /// Cells are visited row by row; each visit shifts the accumulator left
    /// and sets the low bit when the cell is closed or lies off the grid.
    #[must_use]
    pub fn capture(view: &GridView<'_>, tile_x: u32, tile_y: u32) -> Self {
        let origin = tile_origin(tile_x, tile_y);
        let mut closed_bits = 0_u64;
        for y in 0..TILE_SIDE as i32 {
            for x in 0..TILE_SIDE as i32 {
                closed_bits <<= 1;
                if view.is_obstacle(origin.add(CellCoord::new(x, y))) {
                    closed_bits |= 1;
                }
            }
        }
        Self {
            tile_x,
            tile_y,
            closed_bits,
        }
    }

    /// Unpacks the tile into grid coordinates and closed flags.
    ///
    /// Bits are consumed from the lowest upward while walking the tile from
    /// its last cell back to its first.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, bool)> {
        let origin = tile_origin(self.tile_x, self.tile_y);
        let bits = self.closed_bits;
        let last = (TILE_SIDE * TILE_SIDE) as i32 - 1;
        (0..=last).map(move |consumed| {
            let position = last - consumed;
            let x = position % TILE_SIDE as i32;
            let y = position / TILE_SIDE as i32;
            let closed = (bits >> consumed) & 1 == 1;
            (origin.add(CellCoord::new(x, y)), closed)
        })
    }

    /// Reports whether the tile lies inside a grid of the provided side length.
    #[must_use]
    pub fn fits(&self, side: u32) -> bool {
        let tiles_per_side = side / TILE_SIDE;
        self.tile_x < tiles_per_side && self.tile_y < tiles_per_side
    }
}

fn tile_origin(tile_x: u32, tile_y: u32) -> CellCoord {
    let x = tile_x.saturating_mul(TILE_SIDE);
    let y = tile_y.saturating_mul(TILE_SIDE);
    CellCoord::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Flips the closed state of a single cell.
    ToggleCell {
        /// Cell whose state should flip.
        cell: CellCoord,
    },
    /// Forces the closed state of a single cell.
    SetCellClosed {
        /// Cell to update.
        cell: CellCoord,
        /// Desired closed state.
        closed: bool,
    },
    /// Opens every cell in the grid.
    ClearAll,
    /// Closes every cell in the grid.
    FillAll,
    /// Overwrites the closed state of whole tiles, typically from a save file.
    ApplyTiles {
        /// Tile records applied in the order provided.
        tiles: Vec<TileRecord>,
    },
    /// Moves the goal the mover navigates toward.
    SetGoal {
        /// New goal cell.
        cell: CellCoord,
    },
    /// Changes the clearance the mover requires.
    SetMoverSize {
        /// Requested mover size, clamped to the configured clearance range.
        size: u8,
    },
    /// Changes how far from the goal a fallback endpoint may lie.
    SetMaxReach {
        /// Largest accepted fallback distance; zero disables fallbacks.
        reach: u32,
    },
    /// Teleports the mover to the provided cell.
    PlaceMover {
        /// Cell the mover should occupy.
        cell: CellCoord,
    },
    /// Requests that the mover advance a single step.
    MoveMover {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Stores a freshly planned path for presentation.
    SetPath {
        /// Path computed by the pathfinding system.
        path: Path,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a cell changed its closed state.
    CellChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// Closed state after the change.
        closed: bool,
    },
    /// Reports that clearance values were recomputed for a region.
    ClearanceRecomputed {
        /// Region whose clearance values are now current.
        region: CellRect,
    },
    /// Announces that every cell was opened or closed at once.
    GridReset {
        /// Closed state applied to every cell.
        closed: bool,
    },
    /// Confirms that persisted tiles were written into the grid.
    TilesApplied {
        /// Number of tile records applied.
        count: usize,
    },
    /// Reports that a tile batch was refused and the grid left untouched.
    TilesRejected {
        /// Specific reason the batch failed.
        reason: TileRejection,
    },
    /// Announces a new goal cell.
    GoalChanged {
        /// Goal cell after the change.
        cell: CellCoord,
    },
    /// Announces a new mover size.
    MoverSizeChanged {
        /// Size applied after clamping.
        size: u8,
    },
    /// Announces a new fallback reach.
    MaxReachChanged {
        /// Reach applied to subsequent path queries.
        reach: u32,
    },
    /// Confirms that the mover changed cells.
    MoverMoved {
        /// Cell the mover occupied before moving.
        from: CellCoord,
        /// Cell the mover occupies afterwards.
        to: CellCoord,
    },
    /// Reports that a requested step was not possible.
    MoverBlocked {
        /// Direction of the refused step.
        direction: Direction,
    },
    /// Confirms that the stored path was replaced.
    PathUpdated {
        /// Indicates whether the new path ends at the goal.
        reached_goal: bool,
        /// Number of cells on the new path.
        length: usize,
    },
}

/// Reasons a tile batch may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileRejection {
    /// The grid side length is not a multiple of the tile size.
    UnsupportedGridSide {
        /// Side length of the grid.
        side: u32,
    },
    /// A record addressed a tile outside the grid.
    TileOutOfBounds {
        /// Tile column of the offending record.
        tile_x: u32,
        /// Tile row of the offending record.
        tile_y: u32,
    },
}
