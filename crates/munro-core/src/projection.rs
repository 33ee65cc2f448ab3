//! Spherical (Web) Mercator, the projection of the slippy-map tile pyramid.

use std::f64::consts::PI;

use crate::types::LatLng;

pub const TILE_SIZE: f64 = 256.0;

/// Beyond this latitude the projection diverges; tile pyramids stop here.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Screen or world pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(self, o: Point) -> Point {
        Point::new(self.x + o.x, self.y + o.y)
    }

    pub fn sub(self, o: Point) -> Point {
        Point::new(self.x - o.x, self.y - o.y)
    }

    pub fn scale(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// World width in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Lat/long → world pixels at `zoom`. Origin is the north-west corner, y grows south.
pub fn project(p: LatLng, zoom: f64) -> Point {
    let scale = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    Point::new(x, y)
}

/// World pixels at `zoom` → lat/long.
pub fn unproject(pt: Point, zoom: f64) -> LatLng {
    let scale = world_size(zoom);
    let lng = pt.x / scale * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * pt.y / scale);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_origin_and_extent() {
        let nw = project(LatLng::new(MAX_LATITUDE, -180.0), 0.0);
        assert_abs_diff_eq!(nw.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(nw.y, 0.0, epsilon = 1e-6);
        let c = project(LatLng::new(0.0, 0.0), 1.0);
        assert_abs_diff_eq!(c.x, 256.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, 256.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let p = LatLng::new(56.7969, -5.0036);
        let back = unproject(project(p, 9.5), 9.5);
        assert_abs_diff_eq!(back.lat, p.lat, epsilon = 1e-9);
        assert_abs_diff_eq!(back.lng, p.lng, epsilon = 1e-9);
    }

    #[test]
    fn test_north_is_up() {
        let south = project(LatLng::new(55.0, -4.0), 7.0);
        let north = project(LatLng::new(58.0, -4.0), 7.0);
        assert!(north.y < south.y);
    }
}
