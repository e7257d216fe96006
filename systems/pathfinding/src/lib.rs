#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first pathfinding system that keeps the mover's route current.
//!
//! The search runs over the eight-connected grid, only enters cells whose
//! clearance satisfies the request's `min_space`, and refuses diagonal steps
//! that would squeeze between two blocked orthogonal neighbours. When the goal
//! cannot be reached the search may settle for the closest explored cell
//! within the request's reach.

use std::collections::VecDeque;

use clearway_core::{CellCoord, Command, Direction, Event, GridView, Path, PathRequest};
use tracing::{debug, trace};

/// Finds a route using freshly allocated scratch buffers.
///
/// Prefer [`Pathfinder::search`] when querying repeatedly.
#[must_use]
pub fn find_path(view: GridView<'_>, request: &PathRequest) -> Path {
    Pathfinder::default().search(view, request)
}

/// Pure system that reacts to world events and emits refreshed paths.
#[derive(Debug, Default)]
pub struct Pathfinder {
    scratch: SearchScratch,
}

impl Pathfinder {
    /// Creates a pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits a [`Command::SetPath`] when the route may have changed.
    ///
    /// Events that only report path updates, rejected edits, or blocked steps
    /// leave the current route valid and produce no command.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: GridView<'_>,
        request: &PathRequest,
        out: &mut Vec<Command>,
    ) {
        if !events.iter().any(invalidates_path) {
            return;
        }

        let path = self.search(view, request);
        out.push(Command::SetPath { path });
    }

    /// Runs a single breadth-first search for the provided request.
    #[must_use]
    pub fn search(&mut self, view: GridView<'_>, request: &PathRequest) -> Path {
        let scratch = &mut self.scratch;
        scratch.prepare(view.side());
        match view.index(request.start) {
            Some(start_index) => scratch.visited[start_index] = true,
            None => debug!(
                x = request.start.x(),
                y = request.start.y(),
                "path start lies off the grid"
            ),
        }
        scratch.queue.push_back(request.start);

        let goal = request.goal;
        let min_space = request.min_space;
        let max_distance = squared(request.max_distance);
        let max_reach = squared(request.max_reach);
        let can_traverse = |cell: CellCoord| view.traversable(cell, min_space);

        let mut closest: Option<(CellCoord, i64)> = None;
        let mut expanded = 0_usize;

        while let Some(current) = scratch.queue.pop_front() {
            let distance = current.distance_squared(goal);

            if max_distance > 0 && distance > max_distance {
                continue;
            }

            if current == goal {
                let path = scratch.reconstruct(view, request.start, current, true);
                debug!(expanded, length = path.len(), "path reached goal");
                return path;
            }

            if max_reach > 0
                && distance <= max_reach
                && closest.map_or(true, |(_, best)| distance < best)
            {
                trace!(x = current.x(), y = current.y(), distance, "new fallback candidate");
                closest = Some((current, distance));
            }

            expanded += 1;

            for direction in Direction::SEARCH_ORDER {
                let next = current.step(direction);
                let Some(next_index) = view.index(next) else {
                    continue;
                };

                if scratch.visited[next_index] {
                    continue;
                }

                if direction.is_diagonal()
                    && !(can_traverse(current.step(direction.rotate_cw()))
                        && can_traverse(current.step(direction.rotate_ccw())))
                {
                    continue;
                }

                scratch.visited[next_index] = true;

                if !can_traverse(next) {
                    continue;
                }

                scratch.previous[next_index] = current;
                scratch.queue.push_back(next);
            }
        }

        match closest {
            Some((fallback, distance)) => {
                let path = scratch.reconstruct(view, request.start, fallback, false);
                debug!(
                    expanded,
                    length = path.len(),
                    distance,
                    "goal unreachable, settled for fallback"
                );
                path
            }
            None => {
                debug!(expanded, "goal unreachable without fallback");
                Path::empty()
            }
        }
    }
}

fn invalidates_path(event: &Event) -> bool {
    matches!(
        event,
        Event::CellChanged { .. }
            | Event::ClearanceRecomputed { .. }
            | Event::GridReset { .. }
            | Event::TilesApplied { .. }
            | Event::GoalChanged { .. }
            | Event::MoverSizeChanged { .. }
            | Event::MaxReachChanged { .. }
            | Event::MoverMoved { .. }
    )
}

fn squared(value: u32) -> i64 {
    let value = i64::from(value);
    value * value
}

/// Flat per-cell bookkeeping reused between searches.
#[derive(Debug, Default)]
struct SearchScratch {
    visited: Vec<bool>,
    previous: Vec<CellCoord>,
    queue: VecDeque<CellCoord>,
}

impl SearchScratch {
    fn prepare(&mut self, side: u32) {
        let node_count_u64 = u64::from(side) * u64::from(side);
        let node_count = usize::try_from(node_count_u64).unwrap_or(0);

        self.visited.clear();
        self.visited.resize(node_count, false);
        self.previous.clear();
        self.previous.resize(node_count, CellCoord::default());
        self.queue.clear();
    }

    /// Walks predecessors from `end` back to `start` and returns them start-first.
    fn reconstruct(
        &self,
        view: GridView<'_>,
        start: CellCoord,
        end: CellCoord,
        reached_goal: bool,
    ) -> Path {
        let mut cells = vec![end];
        let mut current = end;
        while current != start {
            let Some(index) = view.index(current) else {
                break;
            };
            current = self.previous[index];
            cells.push(current);
        }
        cells.reverse();
        Path {
            cells,
            reached_goal,
        }
    }
}
