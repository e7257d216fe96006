use clearway_core::{CellCoord, Command, Event, GridConfig, GridView, Path, PathRequest};
use clearway_system_pathfinding::{find_path, Pathfinder};
use clearway_world::{self as world, query, World};

fn close_cells(world: &mut World, cells: &[CellCoord]) {
    let mut events = Vec::new();
    for &cell in cells {
        world::apply(world, Command::SetCellClosed { cell, closed: true }, &mut events);
    }
}

fn assert_path_is_legal(view: GridView<'_>, path: &Path, min_space: u8) {
    for pair in path.cells.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let dx = to.x() - from.x();
        let dy = to.y() - from.y();
        assert!(
            dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0),
            "step {from:?} -> {to:?} is not a single move"
        );
        assert!(
            view.traversable(to, min_space),
            "path entered blocked cell {to:?}"
        );
        if dx != 0 && dy != 0 {
            assert!(
                view.traversable(CellCoord::new(from.x() + dx, from.y()), min_space)
                    && view.traversable(CellCoord::new(from.x(), from.y() + dy), min_space),
                "diagonal step {from:?} -> {to:?} cuts a corner"
            );
        }
    }
}

#[test]
fn open_grid_diagonal_route_has_chebyshev_length() {
    let world = World::new();
    let request = PathRequest::new(CellCoord::new(0, 0), CellCoord::new(16, 16), 1);

    let path = find_path(query::grid_view(&world), &request);

    assert!(path.reached_goal);
    assert_eq!(path.len(), 17);
    assert_eq!(path.cells.first(), Some(&CellCoord::new(0, 0)));
    assert_eq!(path.end(), Some(CellCoord::new(16, 16)));
    assert_path_is_legal(query::grid_view(&world), &path, 1);
}

#[test]
fn diagonal_between_two_closed_cells_is_refused() {
    let mut world = World::with_config(GridConfig::new(3, 1));
    close_cells(&mut world, &[CellCoord::new(1, 0), CellCoord::new(0, 1)]);
    let target = query::cell_at(&world, CellCoord::new(1, 1)).copied();
    assert!(target.is_some_and(|cell| cell.traversable(1)));

    let request = PathRequest::new(CellCoord::new(0, 0), CellCoord::new(1, 1), 1);
    let path = find_path(query::grid_view(&world), &request);

    assert_eq!(path, Path::empty());
}

#[test]
fn corner_refusal_still_allows_fallback_to_start() {
    let mut world = World::with_config(GridConfig::new(3, 1));
    close_cells(&mut world, &[CellCoord::new(1, 0), CellCoord::new(0, 1)]);

    let request =
        PathRequest::new(CellCoord::new(0, 0), CellCoord::new(1, 1), 1).with_max_reach(5);
    let path = find_path(query::grid_view(&world), &request);

    assert!(!path.reached_goal);
    assert_eq!(path.cells, vec![CellCoord::new(0, 0)]);
}

#[test]
fn route_walks_around_blocked_corner() {
    let mut world = World::new();
    close_cells(&mut world, &[CellCoord::new(31, 30), CellCoord::new(30, 31)]);

    let request = PathRequest::new(CellCoord::new(30, 30), CellCoord::new(31, 31), 1);
    let view = query::grid_view(&world);
    let path = find_path(view, &request);

    assert!(path.reached_goal);
    assert!(path.len() > 2, "corner must not be cut");
    assert_path_is_legal(view, &path, 1);
}

#[test]
fn corner_refusal_does_not_hide_the_cell_from_other_routes() {
    let mut world = World::new();
    close_cells(&mut world, &[CellCoord::new(51, 50)]);

    // The north-east diagonal from (50, 50) is refused because (51, 50) is
    // closed, yet (51, 49) stays reachable through (50, 49).
    let request = PathRequest::new(CellCoord::new(50, 50), CellCoord::new(51, 49), 1);
    let view = query::grid_view(&world);
    let path = find_path(view, &request);

    assert!(path.reached_goal);
    assert_eq!(
        path.cells,
        vec![
            CellCoord::new(50, 50),
            CellCoord::new(50, 49),
            CellCoord::new(51, 49),
        ]
    );
}

#[test]
fn repeated_searches_are_identical() {
    let mut world = World::new();
    let wall: Vec<_> = (0..100).map(|y| CellCoord::new(40, y)).collect();
    close_cells(&mut world, &wall);
    let scatter: Vec<_> = (0..60)
        .map(|i| CellCoord::new((i * 37) % 120 + 4, (i * 53) % 120 + 4))
        .collect();
    close_cells(&mut world, &scatter);

    let request =
        PathRequest::new(CellCoord::new(5, 5), CellCoord::new(90, 20), 2).with_max_reach(12);
    let view = query::grid_view(&world);

    let mut pathfinder = Pathfinder::new();
    let first = pathfinder.search(view, &request);
    let second = pathfinder.search(view, &request);
    let fresh = find_path(view, &request);

    assert_eq!(first, second);
    assert_eq!(first, fresh);
    assert_path_is_legal(view, &first, 2);
}

fn enclose(world: &mut World, center: CellCoord) {
    let ring: Vec<_> = (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| (dx, dy) != (0, 0))
        .map(|(dx, dy)| CellCoord::new(center.x() + dx, center.y() + dy))
        .collect();
    close_cells(world, &ring);
}

#[test]
fn enclosed_goal_falls_back_to_closest_reachable_cell() {
    let mut world = World::new();
    let goal = CellCoord::new(40, 40);
    enclose(&mut world, goal);

    let request = PathRequest::new(CellCoord::new(10, 10), goal, 1).with_max_reach(3);
    let view = query::grid_view(&world);
    let path = find_path(view, &request);

    assert!(!path.reached_goal);
    let end = path.end().expect("fallback path");
    assert_eq!(end.distance_squared(goal), 4);
    assert_eq!(path.cells.first(), Some(&CellCoord::new(10, 10)));
    assert_path_is_legal(view, &path, 1);
}

#[test]
fn enclosed_goal_without_reachable_cell_in_reach_is_empty() {
    let mut world = World::new();
    let goal = CellCoord::new(40, 40);
    enclose(&mut world, goal);

    let request = PathRequest::new(CellCoord::new(10, 10), goal, 1).with_max_reach(1);
    let path = find_path(query::grid_view(&world), &request);

    assert_eq!(path, Path::empty());
}

#[test]
fn closed_goal_without_reach_is_empty() {
    let mut world = World::new();
    let goal = CellCoord::new(20, 20);
    close_cells(&mut world, &[goal]);

    let request = PathRequest::new(CellCoord::new(0, 0), goal, 1);
    let path = find_path(query::grid_view(&world), &request);

    assert!(!path.reached_goal);
    assert!(path.is_empty());
}

#[test]
fn distance_cutoff_discards_far_start() {
    let world = World::new();
    let request =
        PathRequest::new(CellCoord::new(0, 0), CellCoord::new(50, 50), 1).with_max_distance(10);
    assert_eq!(find_path(query::grid_view(&world), &request), Path::empty());

    let request =
        PathRequest::new(CellCoord::new(45, 45), CellCoord::new(50, 50), 1).with_max_distance(10);
    assert!(find_path(query::grid_view(&world), &request).reached_goal);
}

#[test]
fn mover_size_limits_narrow_gaps() {
    let mut world = World::new();
    let wall: Vec<_> = (0..128)
        .filter(|y| !(60..=62).contains(y))
        .map(|y| CellCoord::new(20, y))
        .collect();
    close_cells(&mut world, &wall);
    let view = query::grid_view(&world);
    let start = CellCoord::new(5, 61);
    let goal = CellCoord::new(35, 61);

    let small = find_path(view, &PathRequest::new(start, goal, 2));
    assert!(small.reached_goal);
    assert!(small.cells.contains(&CellCoord::new(20, 61)));
    assert_path_is_legal(view, &small, 2);

    let large = find_path(view, &PathRequest::new(start, goal, 3));
    assert_eq!(large, Path::empty());
}

#[test]
fn edits_drive_path_refresh_through_the_world() {
    let mut world = World::new();
    let mut pathfinder = Pathfinder::new();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetGoal {
            cell: CellCoord::new(10, 0),
        },
        &mut events,
    );
    pump(&mut world, &mut pathfinder, events);
    assert!(query::path(&world).reached_goal);
    assert_eq!(query::path(&world).len(), 11);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ToggleCell {
            cell: CellCoord::new(5, 0),
        },
        &mut events,
    );
    pump(&mut world, &mut pathfinder, events);

    let path = query::path(&world);
    assert!(path.reached_goal);
    assert!(!path.cells.contains(&CellCoord::new(5, 0)));
    assert_path_is_legal(query::grid_view(&world), path, 1);
}

fn pump(world: &mut World, pathfinder: &mut Pathfinder, pending: Vec<Event>) {
    let mut events = pending;
    while !events.is_empty() {
        let mut commands = Vec::new();
        let request = query::path_request(world);
        pathfinder.handle(&events, query::grid_view(world), &request, &mut commands);

        events = Vec::new();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

/// Walls in every cell of `x0..=x1, y0..=y1` except `open`.
fn pocket(world: &mut World, x0: i32, y0: i32, x1: i32, y1: i32, open: &[CellCoord]) {
    let walls: Vec<_> = (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| CellCoord::new(x, y)))
        .filter(|cell| !open.contains(cell))
        .collect();
    close_cells(world, &walls);
}

#[test]
fn fallback_tie_goes_to_first_cell_in_search_order() {
    let mut world = World::with_config(GridConfig::new(8, 1));
    let start = CellCoord::new(3, 3);
    let north = CellCoord::new(3, 2);
    let east = CellCoord::new(4, 3);
    pocket(&mut world, 2, 1, 5, 4, &[start, north, east]);
    let goal = CellCoord::new(5, 1);
    assert_eq!(north.distance_squared(goal), east.distance_squared(goal));

    let request = PathRequest::new(start, goal, 1).with_max_reach(3);
    let path = find_path(query::grid_view(&world), &request);

    assert!(!path.reached_goal);
    assert_eq!(path.cells, vec![start, north]);
}

#[test]
fn later_tied_candidate_does_not_replace_earlier_one() {
    let mut world = World::with_config(GridConfig::new(8, 1));
    let start = CellCoord::new(4, 3);
    let south = CellCoord::new(4, 4);
    let west = CellCoord::new(3, 3);
    pocket(&mut world, 2, 2, 5, 5, &[start, south, west]);
    let goal = CellCoord::new(2, 5);
    assert_eq!(south.distance_squared(goal), west.distance_squared(goal));

    let request = PathRequest::new(start, goal, 1).with_max_reach(3);
    let path = find_path(query::grid_view(&world), &request);

    // West is dequeued after south; a non-strict comparison would end there.
    assert!(!path.reached_goal);
    assert_eq!(path.cells, vec![start, south]);
    assert_ne!(path.end(), Some(west));
}
