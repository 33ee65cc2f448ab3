//! Map markers for the filtered summits.

use crate::projection::{Point, Size};
use crate::types::{LatLng, Munro};
use crate::viewport::{latlng_to_screen, MapView};

/// Icon geometry, given to every marker explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerIcon {
    /// SVG path data in a `width`×`height` box.
    pub path: &'static str,
    /// Inner dot marking the summit, (cx, cy, r).
    pub dot: (f64, f64, f64),
    pub fill: &'static str,
    pub selected_fill: &'static str,
    pub width: f64,
    pub height: f64,
    /// Icon pixel that sits on the coordinate.
    pub anchor: Point,
    /// Offset from the coordinate to the popup tip.
    pub popup_anchor: Point,
}

/// Mountain-peak triangle.
pub const SUMMIT_ICON: MarkerIcon = MarkerIcon {
    path: "M12 2L3 22h18L12 2zm0 4.5L18.5 20h-13L12 6.5z",
    dot: (12.0, 8.0, 1.5),
    fill: "#2563eb",
    selected_fill: "#dc2626",
    width: 24.0,
    height: 24.0,
    anchor: Point::new(12.0, 24.0),
    popup_anchor: Point::new(0.0, -24.0),
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// `running_no` of the record.
    pub key: u32,
    pub position: LatLng,
    pub icon: MarkerIcon,
}

impl Marker {
    /// Screen rectangle of the icon as (top-left, bottom-right).
    pub fn screen_rect(&self, view: &MapView, size: Size) -> (Point, Point) {
        let tip = latlng_to_screen(view, size, self.position);
        let top_left = tip.sub(self.icon.anchor);
        (
            top_left,
            top_left.add(Point::new(self.icon.width, self.icon.height)),
        )
    }

    /// Screen position of the popup tip.
    pub fn popup_point(&self, view: &MapView, size: Size) -> Point {
        latlng_to_screen(view, size, self.position).add(self.icon.popup_anchor)
    }
}

/// One marker per filtered record that has a usable position, in filter order.
pub fn markers(source: &[Munro], filtered: &[usize], icon: &MarkerIcon) -> Vec<Marker> {
    filtered
        .iter()
        .filter_map(|&i| source.get(i))
        .filter_map(|m| {
            m.position().map(|position| Marker {
                key: m.running_no,
                position,
                icon: *icon,
            })
        })
        .collect()
}

/// Key of the marker under `pt`. Later markers are drawn on top, so they win.
pub fn hit_test(markers: &[Marker], view: &MapView, size: Size, pt: Point) -> Option<u32> {
    markers
        .iter()
        .rev()
        .find(|m| {
            let (tl, br) = m.screen_rect(view, size);
            tl.x <= pt.x && pt.x <= br.x && tl.y <= pt.y && pt.y <= br.y
        })
        .map(|m| m.key)
}
