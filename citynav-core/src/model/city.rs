//! The long-lived city model: street graph, obstacle geometry, and the
//! urban-equipment index the spatial queries run against.

use geo::{Distance, Euclidean, Line, Point, Polygon, Rect};
use log::{debug, info};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::config::ModelConfig;
use super::streets::{StreetGraph, invalidate_graph_edges};
use crate::algo::{select_k, visibility_polygon};

/// Kinds of indexed urban equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Hydrant,
    TrafficLight,
    RadioTower,
}

/// One piece of urban equipment, keyed by its position in the R-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    pub kind: SiteKind,
    pub point: Point<f64>,
}

impl RTreeObject for Site {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

impl PointDistance for Site {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point.x() - point[0];
        let dy = self.point.y() - point[1];
        dx * dx + dy * dy
    }
}

/// Ranking direction of a top-K query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    Nearest,
    Farthest,
}

/// Process-lifetime container the engines operate on. Created once at
/// startup; only edge soft-deletes and site relocation mutate it
/// afterwards.
#[derive(Debug, Default)]
pub struct CityModel {
    pub streets: StreetGraph,
    walls: Vec<Line<f64>>,
    buildings: Vec<Rect<f64>>,
    sites: RTree<Site>,
    config: ModelConfig,
}

impl CityModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn add_wall(&mut self, wall: Line<f64>) {
        self.walls.push(wall);
    }

    pub fn add_building(&mut self, footprint: Rect<f64>) {
        self.buildings.push(footprint);
    }

    pub fn add_site(&mut self, id: &str, kind: SiteKind, x: f64, y: f64) {
        self.sites.insert(Site {
            id: id.to_string(),
            kind,
            point: Point::new(x, y),
        });
    }

    pub fn walls(&self) -> &[Line<f64>] {
        &self.walls
    }

    pub fn buildings(&self) -> &[Rect<f64>] {
        &self.buildings
    }

    pub fn site_count(&self) -> usize {
        self.sites.size()
    }

    /// The region visible from `viewpoint`. Walls always occlude; building
    /// outlines join the obstacle set on request.
    pub fn visibility_polygon(&self, viewpoint: Point<f64>, include_buildings: bool) -> Polygon<f64> {
        let mut obstacles = self.walls.clone();
        if include_buildings {
            obstacles.extend(self.buildings.iter().flat_map(|b| b.to_lines()));
        }
        debug!(
            "visibility query at ({}, {}) over {} obstacle segments",
            viewpoint.x(),
            viewpoint.y(),
            obstacles.len()
        );
        visibility_polygon(viewpoint, &obstacles, self.config.visibility_margin)
    }

    /// Soft-deletes every street edge touched by `polygon`, across the
    /// whole graph. Permanent.
    pub fn invalidate_edges_intersecting(&mut self, polygon: &Polygon<f64>) -> usize {
        invalidate_graph_edges(&mut self.streets, polygon)
    }

    /// The `k` nearest (or farthest) sites of one kind from `origin`,
    /// with their distances. The whole candidate set is measured, then a
    /// heap-limited selection avoids ordering the rest; ties keep index
    /// traversal order.
    pub fn top_k_sites(
        &self,
        origin: Point<f64>,
        kind: SiteKind,
        k: usize,
        rank: Proximity,
    ) -> Vec<(&Site, f64)> {
        let candidates: Vec<(&Site, f64)> = self
            .sites
            .iter()
            .filter(|site| site.kind == kind)
            .map(|site| (site, Euclidean.distance(origin, site.point)))
            .collect();

        select_k(candidates, k, |a, b| match rank {
            Proximity::Nearest => a.1.total_cmp(&b.1),
            Proximity::Farthest => b.1.total_cmp(&a.1),
        })
    }

    /// All sites within `radius` of `center`, via the index's pruned range
    /// lookup.
    pub fn sites_within(&self, center: Point<f64>, radius: f64) -> Vec<&Site> {
        self.sites
            .locate_within_distance([center.x(), center.y()], radius * radius)
            .collect()
    }

    /// Translates every site inside `region` by `(dx, dy)`, re-inserting
    /// each under its new point key. Returns how many moved.
    pub fn relocate_sites(&mut self, region: &Rect<f64>, dx: f64, dy: f64) -> usize {
        let envelope = AABB::from_corners(
            [region.min().x, region.min().y],
            [region.max().x, region.max().y],
        );
        let moving: Vec<Site> = self
            .sites
            .locate_in_envelope(&envelope)
            .cloned()
            .collect();

        for site in &moving {
            self.sites.remove(site);
            let mut moved = site.clone();
            moved.point = Point::new(site.point.x() + dx, site.point.y() + dy);
            self.sites.insert(moved);
        }
        info!("relocated {} sites by ({dx}, {dy})", moving.len());
        moving.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Contains, Coord};

    fn equipped_model() -> CityModel {
        let mut model = CityModel::new(ModelConfig::default());
        model.add_site("h1", SiteKind::Hydrant, 10.0, 0.0);
        model.add_site("h2", SiteKind::Hydrant, 20.0, 0.0);
        model.add_site("h3", SiteKind::Hydrant, 30.0, 0.0);
        model.add_site("t1", SiteKind::TrafficLight, 5.0, 0.0);
        model
    }

    #[test]
    fn top_k_filters_kind_and_ranks_by_distance() {
        let model = equipped_model();
        let nearest = model.top_k_sites(Point::new(0.0, 0.0), SiteKind::Hydrant, 2, Proximity::Nearest);
        let ids: Vec<&str> = nearest.iter().map(|(s, _)| s.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2"]);
        assert_relative_eq!(nearest[0].1, 10.0);

        let farthest = model.top_k_sites(Point::new(0.0, 0.0), SiteKind::Hydrant, 1, Proximity::Farthest);
        assert_eq!(farthest[0].0.id, "h3");
    }

    #[test]
    fn top_k_larger_than_population_returns_all() {
        let model = equipped_model();
        let all = model.top_k_sites(Point::new(0.0, 0.0), SiteKind::TrafficLight, 10, Proximity::Nearest);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn range_query_prunes_by_radius() {
        let model = equipped_model();
        let hits = model.sites_within(Point::new(0.0, 0.0), 21.0);
        let mut ids: Vec<&str> = hits.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["h1", "h2", "t1"]);
    }

    #[test]
    fn relocation_rekeys_the_index() {
        let mut model = equipped_model();
        let region = Rect::new(Coord { x: 5.0, y: -1.0 }, Coord { x: 25.0, y: 1.0 });
        let moved = model.relocate_sites(&region, 100.0, 0.0);
        assert_eq!(moved, 3); // h1, h2, t1

        assert!(model.sites_within(Point::new(10.0, 0.0), 1.0).is_empty());
        let hits = model.sites_within(Point::new(110.0, 0.0), 1.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "h1");
        assert_eq!(model.site_count(), 4);
    }

    #[test]
    fn buildings_occlude_only_on_request() {
        let mut model = CityModel::new(ModelConfig::default());
        model.add_building(Rect::new(
            Coord { x: 40.0, y: 60.0 },
            Coord { x: 60.0, y: 70.0 },
        ));

        let viewpoint = Point::new(50.0, 50.0);
        let behind = Point::new(50.0, 80.0);

        let with_buildings = model.visibility_polygon(viewpoint, true);
        assert!(!with_buildings.contains(&behind));

        let walls_only = model.visibility_polygon(viewpoint, false);
        assert!(walls_only.contains(&behind));
    }
}
