use serde::Serialize;

use crate::court::geometry::{zone_polygon, Point, Polygon};
use crate::types::ZoneId;

/// Where each zone's label (zone number or conversion rate) is drawn.
pub fn label_anchor(zone: ZoneId) -> Point {
    match zone.get() {
        1 => Point::new(-8.5, 16.2),
        2 => Point::new(-5.2, 13.8),
        3 => Point::new(0.0, 13.0),
        4 => Point::new(5.2, 13.8),
        5 => Point::new(8.5, 16.2),
        6 => Point::new(-7.0, 9.5),
        7 => Point::new(0.0, 9.5),
        8 => Point::new(7.0, 9.5),
        _ => Point::new(0.0, 18.5),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneOutline {
    pub zone: ZoneId,
    pub label: String,
    pub anchor: Point,
    pub polygon: Polygon,
}

/// The nine zone polygons, built once and shared by classification and rendering.
#[derive(Debug, Clone)]
pub struct CourtGeometry {
    /// Indexed by `zone - 1`.
    polygons: Vec<Polygon>,
}

impl CourtGeometry {
    pub fn new() -> Self {
        Self {
            polygons: ZoneId::all().map(zone_polygon).collect(),
        }
    }

    pub fn polygon(&self, zone: ZoneId) -> &Polygon {
        &self.polygons[usize::from(zone.get() - 1)]
    }

    /// First zone (in id order) whose polygon contains the point. None means the
    /// click landed outside every zone and the caller keeps its prior selection.
    pub fn classify(&self, x: f64, y: f64) -> Option<ZoneId> {
        let p = Point::new(x, y);
        ZoneId::all().find(|&zone| self.polygon(zone).contains(p))
    }

    pub fn outlines(&self) -> Vec<ZoneOutline> {
        ZoneId::all()
            .map(|zone| ZoneOutline {
                zone,
                label: zone.label(),
                anchor: label_anchor(zone),
                polygon: self.polygon(zone).clone(),
            })
            .collect()
    }
}

impl Default for CourtGeometry {
    fn default() -> Self {
        Self::new()
    }
}
