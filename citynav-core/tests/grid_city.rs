//! End-to-end scenarios over a small grid city: routing, narration,
//! visibility-driven street closures, and interactive navigation.

use citynav_core::prelude::*;
use geo::{Contains, Coord, Line, Point, Rect};

/// 3x3 grid with 100-unit spacing, all streets bidirectional at speed 50.
/// Rows are avenues, columns are streets; node ids are "x-y" in grid
/// coordinates.
fn grid_city(config: ModelConfig) -> CityModel {
    let mut model = CityModel::new(config);

    let mut nodes = Vec::new();
    for gy in 0..3u32 {
        for gx in 0..3u32 {
            let node = model
                .streets
                .add_node(
                    &format!("{gx}-{gy}"),
                    f64::from(gx) * 100.0,
                    f64::from(gy) * 100.0,
                )
                .unwrap();
            nodes.push(node);
        }
    }

    let at = |gx: usize, gy: usize| nodes[gy * 3 + gx];
    for gy in 0..3 {
        for gx in 0..3 {
            if gx + 1 < 3 {
                let street = format!("Avenue {gy}");
                model
                    .streets
                    .add_edge(at(gx, gy), at(gx + 1, gy), None, None, 100.0, 50.0, &street)
                    .unwrap();
                model
                    .streets
                    .add_edge(at(gx + 1, gy), at(gx, gy), None, None, 100.0, 50.0, &street)
                    .unwrap();
            }
            if gy + 1 < 3 {
                let street = format!("Street {gx}");
                model
                    .streets
                    .add_edge(at(gx, gy), at(gx, gy + 1), None, None, 100.0, 50.0, &street)
                    .unwrap();
                model
                    .streets
                    .add_edge(at(gx, gy + 1), at(gx, gy), None, None, 100.0, 50.0, &street)
                    .unwrap();
            }
        }
    }
    model
}

/// Square room of walls around the central intersection (100, 100).
fn add_center_room(model: &mut CityModel) {
    let corners = [
        Coord { x: 60.0, y: 60.0 },
        Coord { x: 140.0, y: 60.0 },
        Coord { x: 140.0, y: 140.0 },
        Coord { x: 60.0, y: 140.0 },
    ];
    for i in 0..4 {
        model.add_wall(Line::new(corners[i], corners[(i + 1) % 4]));
    }
}

#[test]
fn routes_and_narration_across_the_grid() {
    let model = grid_city(ModelConfig::default());
    let mut renderer = GeoJsonRenderer::new();
    let mut sink = TextDirections::new(Vec::new());

    let routes = find_path(
        &model,
        Point::new(5.0, 95.0),
        Point::new(195.0, 105.0),
        PathFindMode::Both,
        Some(&mut renderer),
        &mut sink,
    )
    .unwrap();

    // Straight shot along the middle avenue either way.
    let shortest = routes.shortest.unwrap();
    let quickest = routes.quickest.unwrap();
    assert_eq!(shortest.len(), 3);
    assert_eq!(quickest.len(), 3);
    assert_eq!(shortest.base(), quickest.base());

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert!(text.contains("SHORTEST ROUTE:"));
    assert!(text.contains("QUICKEST ROUTE:"));
    assert!(text.contains("Head east on Avenue 1"));
    assert!(text.contains("arrived at your destination"));

    // Two route polylines of two segments each, plus two connectors each.
    assert_eq!(renderer.len(), 2 * (2 + 2));
    let collection = renderer.into_collection();
    assert_eq!(collection.features.len(), 8);
}

#[test]
fn visibility_room_closes_streets_and_forces_a_detour() {
    let mut model = grid_city(ModelConfig::default());
    add_center_room(&mut model);

    // Inside the closed room, only the room itself is visible.
    let room = model.visibility_polygon(Point::new(100.0, 100.0), false);
    assert!(room.contains(&Point::new(100.0, 120.0)));
    assert!(!room.contains(&Point::new(100.0, 160.0)));
    assert!(!room.contains(&Point::new(10.0, 10.0)));

    // Closing every street the room touches cuts the central
    // intersection out of the network.
    let killed = model.invalidate_edges_intersecting(&room);
    assert!(killed > 0);

    let mut sink = SilentDirections;
    let routes = find_path(
        &model,
        Point::new(0.0, 100.0),
        Point::new(200.0, 100.0),
        PathFindMode::Shortest,
        None,
        &mut sink,
    )
    .unwrap();

    // Previously 3 nodes straight through the center; now a 5-node detour
    // around it.
    let detour = routes.shortest.unwrap();
    assert_eq!(detour.len(), 5);
    let center = model.streets.node_by_id("1-1").unwrap();
    assert!(detour.iter_from_start().all(|n| n != center));
}

#[test]
fn soft_deletes_are_permanent_for_later_queries() {
    let mut model = grid_city(ModelConfig::default());
    add_center_room(&mut model);
    let room = model.visibility_polygon(Point::new(100.0, 100.0), false);
    model.invalidate_edges_intersecting(&room);
    // Re-running the same invalidation finds nothing left to cut.
    assert_eq!(model.invalidate_edges_intersecting(&room), 0);

    // The center is unreachable under both metrics from anywhere.
    let start = model.streets.node_by_id("0-0").unwrap();
    let center = model.streets.node_by_id("1-1").unwrap();
    for metric in [RouteMetric::Distance, RouteMetric::Time] {
        let tree = run_search(&model.streets, start, metric);
        assert!(!tree.reached(center));
    }
}

#[test]
fn navigation_with_deviation_recovers_and_arrives() {
    let config = ModelConfig {
        deviation_threshold: 120.0,
        ..ModelConfig::default()
    };
    let model = grid_city(config);
    let start = model.streets.node_by_id("0-1").unwrap();
    let goal = model.streets.node_by_id("2-1").unwrap();

    let path = find_path_stack(&model.streets, start, goal, RouteMetric::Distance).unwrap();
    let mut session = NavigationSession::new(
        path,
        RouteMetric::Distance,
        model.config().deviation_threshold,
    )
    .unwrap();

    // Wrong turn: north to (0,200), 141 units from the next target at
    // (100,100) - beyond the 120-unit threshold.
    let event = session.advance(&model, Compass::North).unwrap();
    assert!(matches!(event, MoveEvent::Recalculated { .. }));
    assert_eq!(session.state(), SessionState::EnRoute);
    assert_eq!(session.destination(), goal);
    assert_eq!(session.remaining().unwrap().base(), Some(goal));

    // Follow the fresh route: east along the top avenue, then south.
    let mut moves = 0;
    loop {
        let hint = session.heading_hint(&model).expect("target while en route");
        let event = session.advance(&model, hint).unwrap();
        moves += 1;
        assert!(moves < 10, "navigation should settle");
        if matches!(event, MoveEvent::Arrived { .. }) {
            break;
        }
    }
    assert_eq!(session.state(), SessionState::Arrived);
    assert_eq!(session.current_node(), goal);
}

#[test]
fn equipment_queries_rank_and_prune() {
    let mut model = grid_city(ModelConfig::default());
    model.add_site("h-a", SiteKind::Hydrant, 10.0, 0.0);
    model.add_site("h-b", SiteKind::Hydrant, 90.0, 0.0);
    model.add_site("h-c", SiteKind::Hydrant, 150.0, 0.0);
    model.add_site("light-1", SiteKind::TrafficLight, 100.0, 100.0);

    let origin = Point::new(0.0, 0.0);
    let nearest = model.top_k_sites(origin, SiteKind::Hydrant, 2, Proximity::Nearest);
    let ids: Vec<&str> = nearest.iter().map(|(s, _)| s.id.as_str()).collect();
    assert_eq!(ids, vec!["h-a", "h-b"]);

    let in_reach = model.sites_within(origin, 100.0);
    assert_eq!(in_reach.len(), 2);

    // Relocation rekeys the index for subsequent queries.
    let region = Rect::new(Coord { x: 0.0, y: -10.0 }, Coord { x: 100.0, y: 10.0 });
    assert_eq!(model.relocate_sites(&region, 0.0, 500.0), 2);
    assert_eq!(model.sites_within(origin, 100.0).len(), 0);
    assert_eq!(
        model.top_k_sites(origin, SiteKind::Hydrant, 1, Proximity::Nearest)[0]
            .0
            .id,
        "h-c"
    );
}

#[test]
fn visibility_with_buildings_from_a_street_corner() {
    let mut model = grid_city(ModelConfig::default());
    model.add_building(Rect::new(
        Coord { x: 40.0, y: 40.0 },
        Coord { x: 80.0, y: 80.0 },
    ));

    let viewpoint = Point::new(10.0, 100.0);
    let lit = model.visibility_polygon(viewpoint, true);

    // The building blocks the diagonal past it.
    assert!(!lit.contains(&Point::new(110.0, 20.0)));
    // But the view straight east along the avenue is clear.
    assert!(lit.contains(&Point::new(150.0, 100.0)));
}
