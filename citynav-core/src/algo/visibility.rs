//! Radial-sweep visibility: the polygon visible from a viewpoint given a
//! set of opaque obstacle segments.
//!
//! Every segment carries a mutable *shield point* marking where its
//! currently visible sub-span begins; the sweep stitches spans together by
//! emitting shield-to-vertex pieces whenever the front segment changes, so
//! partially occluded segments contribute exactly their visible parts.
//!
//! A boundary rectangle enclosing all geometry (plus a margin) is always
//! added to the obstacle set, so the sweep terminates with a closed
//! polygon even in an open scene. Cost is O(S log S + S^2) for S segment
//! endpoints; the occlusion test deliberately scans the whole active set.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use geo::{Coord, Distance, Euclidean, Line, LineString, Point, Polygon};
use log::debug;

use crate::OCCLUSION_TOLERANCE;

/// Shield points this close to the probing ray are considered on it and
/// produce no sliver span.
const SLIVER_TOLERANCE: f64 = 1e-5;

struct SweepSegment {
    line: Line<f64>,
    shield: Coord<f64>,
}

struct SweepVertex {
    segment: usize,
    point: Coord<f64>,
    angle: f64,
    distance: f64,
    starting: bool,
}

/// Computes the region visible from `viewpoint`. Obstacles are opaque on
/// both sides; `margin` controls the synthetic boundary rectangle spanning
/// from the origin to past all geometry.
pub fn visibility_polygon(
    viewpoint: Point<f64>,
    obstacles: &[Line<f64>],
    margin: f64,
) -> Polygon<f64> {
    let (vx, vy) = (viewpoint.x(), viewpoint.y());

    let mut max_x = vx;
    let mut max_y = vy;
    for line in obstacles {
        max_x = max_x.max(line.start.x).max(line.end.x);
        max_y = max_y.max(line.start.y).max(line.end.y);
    }
    max_x += margin;
    max_y += margin;

    let corners = [
        Coord { x: 0.0, y: 0.0 },
        Coord { x: max_x, y: 0.0 },
        Coord { x: max_x, y: max_y },
        Coord { x: 0.0, y: max_y },
    ];
    let boundary = (0..4).map(|i| Line::new(corners[i], corners[(i + 1) % 4]));

    let mut segments = Vec::with_capacity(obstacles.len() + 4);
    let mut vertices = Vec::with_capacity(2 * (obstacles.len() + 4));
    let mut active: BTreeSet<usize> = BTreeSet::new();

    for line in obstacles.iter().copied().chain(boundary) {
        if line.start == line.end {
            continue;
        }
        let (a_start, d_start) = polar(viewpoint, line.start);
        let (a_end, d_end) = polar(viewpoint, line.end);

        // Orient so the start vertex is swept first. A segment subtending
        // more than pi crosses the +-pi seam: its endpoints swap roles and
        // it is active from the very first ray, shielded at the seam.
        let crosses_seam = (a_start - a_end).abs() > PI;
        let start_first = (a_start <= a_end) != crosses_seam;
        let ((sp, sa, sd), (ep, ea, ed)) = if start_first {
            ((line.start, a_start, d_start), (line.end, a_end, d_end))
        } else {
            ((line.end, a_end, d_end), (line.start, a_start, d_start))
        };

        let index = segments.len();
        let shield = if crosses_seam {
            active.insert(index);
            seam_intersection(&line, viewpoint).unwrap_or(sp)
        } else {
            sp
        };
        segments.push(SweepSegment { line, shield });
        vertices.push(SweepVertex {
            segment: index,
            point: sp,
            angle: sa,
            distance: sd,
            starting: true,
        });
        vertices.push(SweepVertex {
            segment: index,
            point: ep,
            angle: ea,
            distance: ed,
            starting: false,
        });
    }

    vertices.sort_by(|a, b| {
        a.angle
            .total_cmp(&b.angle)
            .then(a.distance.total_cmp(&b.distance))
            .then(a.starting.cmp(&b.starting))
    });

    let mut points: Vec<Coord<f64>> = Vec::new();
    // The fan degenerates when the viewpoint sits on the boundary corner;
    // anchor it explicitly.
    if vx == 0.0 && vy == 0.0 {
        points.push(Coord::zero());
    }

    for vertex in &vertices {
        let vertical = vertex.point.x == vx;
        let (slope, intercept) = if vertical {
            (0.0, 0.0)
        } else {
            let slope = (vertex.point.y - vy) / (vertex.point.x - vx);
            (slope, vy - slope * vx)
        };

        // Probe every other active segment along the ray to the vertex.
        // Anything at the same distance within tolerance counts as
        // occluding; degenerate intersections are simply skipped.
        let mut in_front = true;
        let mut behind: Option<(usize, Coord<f64>, f64)> = None;
        for &other in &active {
            if other == vertex.segment {
                continue;
            }
            // A segment meeting this vertex endpoint-to-endpoint is an
            // adjacent face, not an occluder; the tie at the shared corner
            // must not swallow either span.
            let other_line = segments[other].line;
            if other_line.start == vertex.point || other_line.end == vertex.point {
                continue;
            }
            let Some(hit) =
                ray_line_intersection(vertical, slope, intercept, vertex.point, &other_line)
            else {
                continue;
            };
            let hit_distance = Euclidean.distance(viewpoint, Point::from(hit));
            if hit_distance < vertex.distance
                || (hit_distance - vertex.distance).abs() < OCCLUSION_TOLERANCE
            {
                in_front = false;
                break;
            }
            if behind.is_none_or(|(_, _, d)| hit_distance < d) {
                behind = Some((other, hit, hit_distance));
            }
        }

        if in_front {
            if !vertex.starting {
                // The front segment ends: close its span and hand the
                // shield to the segment revealed behind it.
                points.push(segments[vertex.segment].shield);
                points.push(vertex.point);
                if let Some((revealed, hit, _)) = behind {
                    segments[revealed].shield = hit;
                }
            } else if let Some((occluded, hit, _)) = behind {
                // A nearer segment begins: close the span of the segment
                // it hides, unless that span would be a sliver on the ray.
                let shield = segments[occluded].shield;
                let on_ray =
                    !vertical && (slope * shield.x + intercept - shield.y).abs() <= SLIVER_TOLERANCE;
                if !on_ray {
                    points.push(shield);
                    points.push(hit);
                }
            }
        }

        if vertex.starting {
            segments[vertex.segment].shield = vertex.point;
            active.insert(vertex.segment);
        } else {
            active.remove(&vertex.segment);
        }
    }

    // Close the span still open across the seam where the sweep ends.
    let seam_hit = active
        .iter()
        .filter_map(|&s| seam_intersection(&segments[s].line, viewpoint).map(|hit| (s, hit)))
        .min_by(|a, b| (vx - a.1.x).total_cmp(&(vx - b.1.x)));
    if let Some((segment, hit)) = seam_hit {
        points.push(segments[segment].shield);
        points.push(hit);
    }

    debug!(
        "visibility sweep over {} segments produced {} polygon points",
        segments.len(),
        points.len()
    );

    if let Some(&first) = points.first() {
        points.push(first);
    }
    Polygon::new(LineString::from(points), vec![])
}

fn polar(viewpoint: Point<f64>, point: Coord<f64>) -> (f64, f64) {
    let angle = (point.y - viewpoint.y()).atan2(point.x - viewpoint.x());
    let distance = Euclidean.distance(viewpoint, Point::from(point));
    (angle, distance)
}

/// Intersection of the probing ray (given by `slope`/`intercept`, or the
/// vertical through `vertex`) with the supporting line of `other`. The
/// vertical-segment branch avoids the division by zero of the slope form;
/// parallel and otherwise degenerate configurations yield `None`.
fn ray_line_intersection(
    vertical: bool,
    slope: f64,
    intercept: f64,
    vertex: Coord<f64>,
    other: &Line<f64>,
) -> Option<Coord<f64>> {
    let (p1, p2) = (other.start, other.end);
    let (xi, yi);
    if p1.x == p2.x {
        if vertical {
            return None;
        }
        xi = p1.x;
        yi = slope * xi + intercept;
    } else {
        let other_slope = (p2.y - p1.y) / (p2.x - p1.x);
        let other_intercept = p1.y - other_slope * p1.x;
        xi = if vertical {
            vertex.x
        } else {
            (other_intercept - intercept) / (slope - other_slope)
        };
        yi = other_slope * xi + other_intercept;
    }
    (xi.is_finite() && yi.is_finite()).then_some(Coord { x: xi, y: yi })
}

/// Where `line` crosses the leftward horizontal ray from the viewpoint
/// (the sweep's start/end seam), if it does.
fn seam_intersection(line: &Line<f64>, viewpoint: Point<f64>) -> Option<Coord<f64>> {
    let (p1, p2) = (line.start, line.end);
    let dy = p2.y - p1.y;
    if dy == 0.0 {
        return None;
    }
    let t = (viewpoint.y() - p1.y) / dy;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let xi = p1.x + t * (p2.x - p1.x);
    (xi < viewpoint.x()).then_some(Coord {
        x: xi,
        y: viewpoint.y(),
    })
}
