//! Plain-text rendering of the editor grid.

use std::collections::HashSet;

use clearway_core::CellCoord;
use clearway_world::{query, World};

/// What each cell character conveys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderMode {
    /// `#` closed, `.` open, `*` path, `S` mover, `G` goal.
    Cells,
    /// Base-36 clearance digit per cell, `+` once the value no longer fits.
    Clearance,
}

pub(crate) fn render(world: &World, mode: RenderMode) -> String {
    let view = query::grid_view(world);
    let side = i32::try_from(view.side()).unwrap_or(i32::MAX);
    let mover = query::mover(world).cell;
    let goal = query::goal(world);
    let path: HashSet<CellCoord> = query::path(world).cells.iter().copied().collect();

    let mut out = String::with_capacity((view.side() as usize + 1) * view.side() as usize);
    for y in 0..side {
        for x in 0..side {
            let cell = CellCoord::new(x, y);
            let Some(state) = view.cell_at(cell) else {
                continue;
            };
            let glyph = match mode {
                RenderMode::Clearance => {
                    char::from_digit(u32::from(state.space), 36).unwrap_or('+')
                }
                RenderMode::Cells if cell == mover => 'S',
                RenderMode::Cells if cell == goal => 'G',
                RenderMode::Cells if path.contains(&cell) => '*',
                RenderMode::Cells if state.closed => '#',
                RenderMode::Cells => '.',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
