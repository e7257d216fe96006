//! Clearance field maintained alongside the world's grid.

use clearway_core::{CellCoord, CellRect};

use crate::grid::Grid;

/// Offset probed while searching for the nearest obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Probe {
    offset: CellCoord,
    distance: u8,
}

/// Windowed nearest-obstacle search that keeps every cell's `space` current.
///
/// Each open cell scans the `(2 * max + 1)^2` window around itself and takes
/// the smallest clamped rounded distance to a closed or off-grid cell. Probes
/// are precomputed once and ordered by distance, so the scan stops at the
/// first obstacle it meets; probes whose distance already equals the clamp can
/// never lower the value and are dropped from the table.
#[derive(Clone, Debug)]
pub(crate) struct ClearanceField {
    max_clearance: u8,
    probes: Vec<Probe>,
}

impl ClearanceField {
    pub(crate) fn new(max_clearance: u8) -> Self {
        let radius = i32::from(max_clearance);
        let origin = CellCoord::default();
        let mut probes = Vec::new();

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let offset = CellCoord::new(dx, dy);
                let rounded = origin.rounded_distance(offset);
                let distance = u8::try_from(rounded)
                    .unwrap_or(max_clearance)
                    .min(max_clearance);
                if distance >= max_clearance {
                    continue;
                }
                probes.push(Probe { offset, distance });
            }
        }

        probes.sort_by_key(|probe| probe.distance);

        Self {
            max_clearance,
            probes,
        }
    }

    /// Recomputes a single cell. Returns `false` when the cell lies off the grid.
    pub(crate) fn recompute_cell(&self, grid: &mut Grid, cell: CellCoord) -> bool {
        let Some(current) = grid.cell_at(cell) else {
            return false;
        };

        let space = if current.closed {
            0
        } else {
            self.scan(grid, cell)
        };

        if let Some(slot) = grid.cell_at_mut(cell) {
            slot.space = space;
        }
        true
    }

    /// Recomputes every on-grid cell inside the half-open region.
    pub(crate) fn recompute_region(&self, grid: &mut Grid, region: CellRect) -> CellRect {
        let clamped = region.clamp_to(grid.side());
        if clamped.is_empty() {
            return clamped;
        }
        for cell in clamped.cells() {
            let _ = self.recompute_cell(grid, cell);
        }
        clamped
    }

    pub(crate) fn recompute_all(&self, grid: &mut Grid) -> CellRect {
        self.recompute_region(grid, CellRect::covering(grid.side()))
    }

    /// Region that must be refreshed after the closed state of `cell` changes.
    pub(crate) fn influence(&self, cell: CellCoord) -> CellRect {
        CellRect::around(cell, u32::from(self.max_clearance))
    }

    fn scan(&self, grid: &Grid, cell: CellCoord) -> u8 {
        let view = grid.view();
        let mut space = self.max_clearance;
        for probe in &self.probes {
            if probe.distance >= space {
                break;
            }
            if view.is_obstacle(cell + probe.offset) {
                space = probe.distance;
                break;
            }
        }
        space
    }
}
