//! Which base-map tiles cover the view, and where they go on screen.

use std::collections::HashMap;

use crate::projection::{project, Point, Size, TILE_SIZE};
use crate::viewport::MapView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fill `{s}`, `{z}`, `{x}`, `{y}` in a URL template. The subdomain is
    /// picked from the tile position so a tile always maps to the same host.
    pub fn url(&self, template: &str, subdomains: &[String]) -> String {
        let s = if subdomains.is_empty() {
            ""
        } else {
            subdomains[((self.x + self.y) as usize) % subdomains.len()].as_str()
        };
        template
            .replace("{s}", s)
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A tile and its screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub id: TileId,
    pub origin: Point,
    pub size: f64,
}

/// Integer tile level used to draw a fractional zoom.
pub fn tile_zoom(zoom: f64, max_zoom: f64) -> u32 {
    zoom.round().clamp(0.0, max_zoom.max(0.0)) as u32
}

/// Tiles covering the viewport, row by row from the north-west.
pub fn visible_tiles(view: &MapView, size: Size, max_zoom: f64) -> Vec<PlacedTile> {
    if size.is_empty() {
        return Vec::new();
    }
    let z = tile_zoom(view.zoom, max_zoom);
    let scale = 2f64.powf(view.zoom - z as f64);
    let tile_px = TILE_SIZE * scale;

    // World pixels at tile level z.
    let center = project(view.center, z as f64);
    let half = Point::new(size.width / 2.0 / scale, size.height / 2.0 / scale);
    let max_index = (1u64 << z) as f64 - 1.0;

    let x0 = ((center.x - half.x) / TILE_SIZE).floor().clamp(0.0, max_index) as u32;
    let x1 = ((center.x + half.x) / TILE_SIZE).floor().clamp(0.0, max_index) as u32;
    let y0 = ((center.y - half.y) / TILE_SIZE).floor().clamp(0.0, max_index) as u32;
    let y1 = ((center.y + half.y) / TILE_SIZE).floor().clamp(0.0, max_index) as u32;

    let mut tiles = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let world = Point::new(x as f64 * TILE_SIZE, y as f64 * TILE_SIZE);
            let origin = world.sub(center).scale(scale).add(size.half());
            tiles.push(PlacedTile {
                id: TileId { z, x, y },
                origin,
                size: tile_px,
            });
        }
    }
    tiles
}

/// Least-recently-drawn bookkeeping for a tile cache. Tiles used in the
/// current frame are never evicted, so the cap may be exceeded by one screen.
#[derive(Debug, Default)]
pub struct TileLru {
    frame: u64,
    last_used: HashMap<TileId, u64>,
}

impl TileLru {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    pub fn touch(&mut self, id: TileId) {
        self.last_used.insert(id, self.frame);
    }

    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }

    /// Forget the oldest tiles until at most `cap` remain, and return them.
    pub fn evict(&mut self, cap: usize) -> Vec<TileId> {
        if self.last_used.len() <= cap {
            return Vec::new();
        }
        let mut stale: Vec<(u64, TileId)> = self
            .last_used
            .iter()
            .filter(|(_, &f)| f < self.frame)
            .map(|(&id, &f)| (f, id))
            .collect();
        stale.sort_by_key(|&(f, id)| (f, id.z, id.y, id.x));

        let excess = self.last_used.len() - cap;
        let evicted: Vec<TileId> = stale.into_iter().take(excess).map(|(_, id)| id).collect();
        for id in &evicted {
            self.last_used.remove(id);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OSM_SUBDOMAINS, OSM_TILE_URL};
    use crate::types::LatLng;

    fn subdomains() -> Vec<String> {
        OSM_SUBDOMAINS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_url_template() {
        let t = TileId { z: 7, x: 62, y: 39 };
        assert_eq!(
            t.url(OSM_TILE_URL, &subdomains()),
            "https://c.tile.openstreetmap.org/7/62/39.png"
        );
        assert_eq!(t.url("/tiles/{z}/{x}/{y}", &[]), "/tiles/7/62/39");
    }

    #[test]
    fn test_tiles_cover_viewport() {
        let view = MapView::new(LatLng::new(56.8, -4.2), 7.0);
        let size = Size::new(800.0, 600.0);
        let tiles = visible_tiles(&view, size, 14.0);
        assert!(!tiles.is_empty());
        let min_x = tiles.iter().map(|t| t.origin.x).fold(f64::INFINITY, f64::min);
        let min_y = tiles.iter().map(|t| t.origin.y).fold(f64::INFINITY, f64::min);
        let max_x = tiles
            .iter()
            .map(|t| t.origin.x + t.size)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_y = tiles
            .iter()
            .map(|t| t.origin.y + t.size)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(min_x <= 0.0 && min_y <= 0.0);
        assert!(max_x >= size.width && max_y >= size.height);
        assert!(tiles.iter().all(|t| t.id.z == 7));
    }

    #[test]
    fn test_fractional_zoom_scales_tiles() {
        let view = MapView::new(LatLng::new(56.8, -4.2), 7.25);
        let tiles = visible_tiles(&view, Size::new(512.0, 512.0), 14.0);
        assert!(tiles.iter().all(|t| t.id.z == 7));
        let expected = 256.0 * 2f64.powf(0.25);
        assert!(tiles.iter().all(|t| (t.size - expected).abs() < 1e-9));
    }

    #[test]
    fn test_empty_viewport_has_no_tiles() {
        let view = MapView::new(LatLng::new(56.8, -4.2), 7.0);
        assert!(visible_tiles(&view, Size::new(0.0, 600.0), 14.0).is_empty());
    }

    fn tile(x: u32) -> TileId {
        TileId { z: 9, x, y: 150 }
    }

    #[test]
    fn test_lru_bounded_while_panning() {
        let mut lru = TileLru::new();
        // Pan east one column per frame, four tiles visible each time.
        for step in 0..100 {
            lru.begin_frame();
            for x in step..step + 4 {
                lru.touch(tile(x));
            }
            lru.evict(10);
            assert!(lru.len() <= 10);
        }
        // Columns 93..=102 remain; the westmost are the oldest.
        lru.begin_frame();
        lru.touch(tile(500));
        let evicted = lru.evict(4);
        assert_eq!(evicted, (93..100).map(tile).collect::<Vec<_>>());
        assert_eq!(lru.len(), 4);
    }

    #[test]
    fn test_lru_keeps_current_frame() {
        let mut lru = TileLru::new();
        lru.begin_frame();
        lru.touch(tile(1));
        lru.begin_frame();
        for x in 10..20 {
            lru.touch(tile(x));
        }
        assert_eq!(lru.evict(4), vec![tile(1)]);
        assert_eq!(lru.len(), 10);
        assert!(lru.evict(4).is_empty());
    }
}
