//! Dense cell storage owned by the world.

use clearway_core::{Cell, CellCoord, GridView};

/// Row-major square array of cells.
///
/// Coordinates outside `[0, side)` never resolve to a cell; callers treat the
/// absence as a closed wall.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    side: u32,
    max_clearance: u8,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a fully open grid. Clearance values stay zero until recomputed.
    pub(crate) fn new(side: u32, max_clearance: u8) -> Self {
        let capacity_u64 = u64::from(side) * u64::from(side);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            side,
            max_clearance,
            cells: vec![Cell::default(); capacity],
        }
    }

    pub(crate) fn side(&self) -> u32 {
        self.side
    }

    pub(crate) fn max_clearance(&self) -> u8 {
        self.max_clearance
    }

    pub(crate) fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.side, self.max_clearance)
    }

    pub(crate) fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    pub(crate) fn cell_at(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub(crate) fn cell_at_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }

    /// Writes the closed flag, returning `true` when the cell actually changed.
    ///
    /// Clearance is left stale; the caller recomputes the surrounding region.
    pub(crate) fn set_closed(&mut self, cell: CellCoord, closed: bool) -> bool {
        match self.cell_at_mut(cell) {
            Some(slot) if slot.closed != closed => {
                slot.closed = closed;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn clear_all(&mut self) {
        self.set_all(false);
    }

    pub(crate) fn fill_all(&mut self) {
        self.set_all(true);
    }

    fn set_all(&mut self, closed: bool) {
        for cell in &mut self.cells {
            cell.closed = closed;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x < self.side && y < self.side {
            let row = usize::try_from(y).ok()?;
            let column = usize::try_from(x).ok()?;
            let width = usize::try_from(self.side).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
