//! Biarc restraint lines and the zone polygons sampled from them.
//!
//! The 6m and 9m lines of a handball court are a flat segment between the posts
//! joined to two quarter arcs centred on the posts. Zones are approximated by
//! sampling those arcs into polygons so that classification and rendering share
//! a single point-in-polygon test.

use serde::Serialize;

use crate::config::court_dims::*;
use crate::config::CURVE_SAMPLES;
use crate::types::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed ring of vertices; the edge from the last vertex back to the first is implied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Iterates `(from, to)` for every edge including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd ray cast towards +x. Edges are half-open in y (`y_min <= p.y < y_max`),
    /// so a point on a shared horizontal boundary belongs to exactly one side.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            let (y_min, y_max) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
            if p.y < y_min || p.y >= y_max {
                continue;
            }
            let t = (p.y - a.y) / (b.y - a.y);
            let x_cross = a.x + t * (b.x - a.x);
            if x_cross > p.x {
                inside = !inside;
            }
        }
        inside
    }
}

/// y of the biarc of radius `r` at `x`, or None where the arc has no point at that x.
pub fn curve_y(x: f64, r: f64) -> Option<f64> {
    if (-HALF_GOAL..=HALF_GOAL).contains(&x) {
        return Some(GOAL_Y - r);
    }
    let post = if x < -HALF_GOAL { -HALF_GOAL } else { HALF_GOAL };
    let dx = x - post;
    if dx.abs() > r {
        return None;
    }
    let y = GOAL_Y - (r * r - dx * dx).sqrt();
    (y <= GOAL_Y).then_some(y)
}

/// How a zone's polygon is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneShape {
    /// Between the 6m and 9m curves.
    Band { x_left: f64, x_right: f64 },
    /// From the 9m curve out to the baseline.
    Outer { x_left: f64, x_right: f64 },
    /// The 7-meter throw box.
    PenaltyBox,
}

pub fn zone_shape(zone: ZoneId) -> ZoneShape {
    match zone.get() {
        1 => ZoneShape::Band { x_left: -HALF_WIDTH, x_right: -7.0 },
        2 => ZoneShape::Band { x_left: -7.0, x_right: -3.0 },
        3 => ZoneShape::Band { x_left: -3.0, x_right: 3.0 },
        4 => ZoneShape::Band { x_left: 3.0, x_right: 7.0 },
        5 => ZoneShape::Band { x_left: 7.0, x_right: HALF_WIDTH },
        6 => ZoneShape::Outer { x_left: -HALF_WIDTH, x_right: -3.0 },
        7 => ZoneShape::Outer { x_left: -3.0, x_right: 3.0 },
        8 => ZoneShape::Outer { x_left: 3.0, x_right: HALF_WIDTH },
        _ => ZoneShape::PenaltyBox,
    }
}

pub fn zone_polygon(zone: ZoneId) -> Polygon {
    let points = match zone_shape(zone) {
        ZoneShape::Band { x_left, x_right } => {
            let xs = linspace(x_left, x_right, CURVE_SAMPLES);
            let mut points = sample_curve(xs.iter().copied(), INNER_RADIUS);
            points.extend(sample_curve(xs.iter().rev().copied(), OUTER_RADIUS));
            points
        }
        ZoneShape::Outer { x_left, x_right } => {
            let xs = linspace(x_left, x_right, CURVE_SAMPLES);
            let mut points = sample_curve(xs.into_iter(), OUTER_RADIUS);
            points.push(Point::new(x_right, OUTER_BASELINE_Y));
            points.push(Point::new(x_left, OUTER_BASELINE_Y));
            points
        }
        ZoneShape::PenaltyBox => vec![
            Point::new(-PENALTY_BOX_HALF_WIDTH, PENALTY_BOX_FAR_Y),
            Point::new(PENALTY_BOX_HALF_WIDTH, PENALTY_BOX_FAR_Y),
            Point::new(PENALTY_BOX_HALF_WIDTH, PENALTY_BOX_NEAR_Y),
            Point::new(-PENALTY_BOX_HALF_WIDTH, PENALTY_BOX_NEAR_Y),
        ],
    };
    Polygon::new(points)
}

/// Samples off the curve's domain are pinned to the goal line so the ring stays closed.
fn sample_curve(xs: impl Iterator<Item = f64>, r: f64) -> Vec<Point> {
    xs.map(|x| Point::new(x, curve_y(x, r).unwrap_or(GOAL_Y)))
        .collect()
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn orientation(a: Point, b: Point, c: Point) -> f64 {
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    }

    fn segments_cross(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
        let d1 = orientation(q1, q2, p1);
        let d2 = orientation(q1, q2, p2);
        let d3 = orientation(p1, p2, q1);
        let d4 = orientation(p1, p2, q2);
        d1 * d2 < 0.0 && d3 * d4 < 0.0
    }

    #[test]
    fn flat_segment_between_posts() {
        for r in [INNER_RADIUS, OUTER_RADIUS] {
            for x in [-1.5, -0.75, 0.0, 1.0, 1.5] {
                assert_eq!(curve_y(x, r), Some(GOAL_Y - r), "x={x} r={r}");
            }
        }
    }

    #[test]
    fn arc_is_centred_on_nearer_post() {
        // 3-4-5 triangle from the right post.
        let y = curve_y(1.5 + 3.0, 5.0).unwrap();
        assert!((y - 16.0).abs() < 1e-9, "y={y}");
        let y = curve_y(-1.5 - 3.0, 5.0).unwrap();
        assert!((y - 16.0).abs() < 1e-9, "y={y}");
    }

    #[test]
    fn undefined_beyond_radius() {
        assert_eq!(curve_y(-1.5 - 6.01, INNER_RADIUS), None);
        assert_eq!(curve_y(1.5 + 9.5, OUTER_RADIUS), None);
        assert_eq!(curve_y(10.0, INNER_RADIUS), None);
        assert!(curve_y(1.5 + 6.0, INNER_RADIUS).is_some());
    }

    #[test]
    fn polygon_sizes() {
        for zone in ZoneId::all() {
            let poly = zone_polygon(zone);
            let expected = match zone.get() {
                1..=5 => 2 * CURVE_SAMPLES,
                6..=8 => CURVE_SAMPLES + 2,
                _ => 4,
            };
            assert_eq!(poly.len(), expected, "zone {zone}");
            assert!(poly.len() >= 4);
        }
    }

    #[test]
    fn band_runs_left_to_right_then_back() {
        let poly = zone_polygon(ZoneId::new(2).unwrap());
        let pts = poly.points();
        assert_eq!(pts[0].x, -7.0);
        assert_eq!(pts[CURVE_SAMPLES - 1].x, -3.0);
        assert_eq!(pts[CURVE_SAMPLES].x, -3.0);
        assert_eq!(pts[2 * CURVE_SAMPLES - 1].x, -7.0);
    }

    #[test]
    fn off_domain_samples_clamp_to_goal_line() {
        // Zone 1 starts beyond the 6m arc's reach.
        let poly = zone_polygon(ZoneId::new(1).unwrap());
        assert_eq!(poly.points()[0], Point::new(-10.0, GOAL_Y));
    }

    #[test]
    fn polygons_stay_in_scorable_band() {
        for zone in ZoneId::all() {
            for p in zone_polygon(zone).points() {
                assert!((7.5..=20.0).contains(&p.y), "zone {zone} point {p:?}");
                assert!((-10.0..=10.0).contains(&p.x), "zone {zone} point {p:?}");
            }
        }
    }

    #[test]
    fn polygons_do_not_self_intersect() {
        for zone in ZoneId::all() {
            let edges: Vec<_> = zone_polygon(zone).edges().collect();
            let n = edges.len();
            for i in 0..n {
                for j in (i + 2)..n {
                    if i == 0 && j == n - 1 {
                        continue;
                    }
                    let (a1, a2) = edges[i];
                    let (b1, b2) = edges[j];
                    assert!(!segments_cross(a1, a2, b1, b2), "zone {zone}: edges {i} and {j} cross");
                }
            }
        }
    }

    #[test]
    fn unit_square_containment() {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!(square.contains(Point::new(0.5, 0.5)));
        assert!(!square.contains(Point::new(1.5, 0.5)));
        assert!(!square.contains(Point::new(0.5, -0.1)));
        // Half-open in y: bottom edge in, top edge out.
        assert!(square.contains(Point::new(0.5, 0.0)));
        assert!(!square.contains(Point::new(0.5, 1.0)));
    }
}
