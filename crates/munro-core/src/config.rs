use crate::types::{LatLng, LatLngBounds};

/// OpenStreetMap standard tile layer.
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];
pub const OSM_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";
pub const OSM_COPYRIGHT_URL: &str = "https://www.openstreetmap.org/copyright";

/// Fixed parameters of the map view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Hard outer clamp; the view never shows anything outside it.
    pub max_bounds: LatLngBounds,
    pub default_center: LatLng,
    pub default_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom levels are multiples of this.
    pub zoom_snap: f64,
    /// Screen-space margin kept around fitted points, in CSS pixels.
    pub fit_padding: f64,
    pub tile_url: String,
    pub tile_subdomains: Vec<String>,
    pub attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Scotland
            max_bounds: LatLngBounds::new(LatLng::new(54.6, -7.5), LatLng::new(60.9, -0.5)),
            default_center: LatLng::new(56.8, -4.2),
            default_zoom: 7.0,
            min_zoom: 6.0,
            max_zoom: 14.0,
            zoom_snap: 0.25,
            fit_padding: 20.0,
            tile_url: OSM_TILE_URL.to_string(),
            tile_subdomains: OSM_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            attribution: OSM_ATTRIBUTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_centre_inside_clamp() {
        let c = MapConfig::default();
        assert!(c.max_bounds.contains(c.default_center));
        assert!(c.min_zoom <= c.default_zoom && c.default_zoom <= c.max_zoom);
        assert_eq!(c.tile_subdomains, vec!["a", "b", "c"]);
    }
}
