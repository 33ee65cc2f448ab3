//! Fitting the map view to a set of summits and keeping it inside the clamp box.
//!
//! Every function that produces a [`MapView`] passes it through
//! [`clamp_view`] last, so no caller can obtain a view that shows ground
//! outside [`ViewConstraints::max_bounds`] or sits outside the zoom range.

use crate::config::MapConfig;
use crate::projection::{project, unproject, Point, Size};
use crate::types::{LatLng, LatLngBounds, Munro};

/// Centre and (fractional) zoom of the live map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

impl MapView {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConstraints {
    pub max_bounds: LatLngBounds,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_snap: f64,
}

impl From<&MapConfig> for ViewConstraints {
    fn from(c: &MapConfig) -> Self {
        Self {
            max_bounds: c.max_bounds,
            min_zoom: c.min_zoom,
            max_zoom: c.max_zoom,
            zoom_snap: c.zoom_snap,
        }
    }
}

impl Default for ViewConstraints {
    fn default() -> Self {
        Self::from(&MapConfig::default())
    }
}

/// Bounding rectangle of every point with a usable position, or `None` if
/// there is nothing to fit.
pub fn fit<'a, I>(points: I) -> Option<LatLngBounds>
where
    I: IntoIterator<Item = &'a Munro>,
{
    let mut bounds = LatLngBounds::empty();
    for p in points.into_iter().filter_map(Munro::position) {
        bounds.expand_point(p);
    }
    (!bounds.is_empty()).then_some(bounds)
}

/// Grow `bounds` by `padding` screen pixels on every side at `zoom`.
pub fn pad_bounds(bounds: &LatLngBounds, zoom: f64, padding: f64) -> LatLngBounds {
    let sw = project(bounds.south_west(), zoom);
    let ne = project(bounds.north_east(), zoom);
    LatLngBounds::new(
        unproject(Point::new(sw.x - padding, sw.y + padding), zoom),
        unproject(Point::new(ne.x + padding, ne.y - padding), zoom),
    )
}

fn snap_down(zoom: f64, snap: f64) -> f64 {
    if snap > 0.0 {
        (zoom / snap).floor() * snap
    } else {
        zoom
    }
}

fn snap_up(zoom: f64, snap: f64) -> f64 {
    if snap > 0.0 {
        (zoom / snap).ceil() * snap
    } else {
        zoom
    }
}

/// Largest zoom at which `bounds` fits inside `size` (minus padding on every side).
fn bounds_zoom(bounds: &LatLngBounds, size: Size, padding: f64, snap: f64) -> f64 {
    let avail_w = (size.width - 2.0 * padding).max(1.0);
    let avail_h = (size.height - 2.0 * padding).max(1.0);
    let sw = project(bounds.south_west(), 0.0);
    let ne = project(bounds.north_east(), 0.0);
    let w = (ne.x - sw.x).abs();
    let h = (sw.y - ne.y).abs();
    let scale = (avail_w / w).min(avail_h / h);
    if !scale.is_finite() {
        // single point
        return f64::INFINITY;
    }
    snap_down(scale.log2(), snap)
}

/// Lowest zoom at which a viewport of `size` lies wholly inside `max_bounds`.
fn containing_zoom(c: &ViewConstraints, size: Size) -> f64 {
    let sw = project(c.max_bounds.south_west(), 0.0);
    let ne = project(c.max_bounds.north_east(), 0.0);
    let w = ne.x - sw.x;
    let h = sw.y - ne.y;
    let scale = (size.width / w).max(size.height / h);
    if scale.is_finite() && scale > 0.0 {
        snap_up(scale.log2(), c.zoom_snap)
    } else {
        c.min_zoom
    }
}

/// Enforce zoom limits and the outer clamp box. Strict: the returned view's
/// visible rectangle never leaves `max_bounds`.
pub fn clamp_view(view: MapView, size: Size, c: &ViewConstraints) -> MapView {
    let min_zoom = if size.is_empty() {
        c.min_zoom
    } else {
        c.min_zoom.max(containing_zoom(c, size))
    };
    let zoom = if view.zoom.is_finite() {
        view.zoom.clamp(min_zoom.min(c.max_zoom), c.max_zoom)
    } else {
        c.max_zoom
    };

    let half = size.half();
    let box_nw = project(LatLng::new(c.max_bounds.north, c.max_bounds.west), zoom);
    let box_se = project(LatLng::new(c.max_bounds.south, c.max_bounds.east), zoom);
    let center = if view.center.is_valid() {
        project(view.center, zoom)
    } else {
        project(c.max_bounds.center(), zoom)
    };

    let clamp_axis = |v: f64, lo: f64, hi: f64, half: f64| {
        if hi - lo <= 2.0 * half {
            (lo + hi) / 2.0
        } else {
            v.clamp(lo + half, hi - half)
        }
    };
    let x = clamp_axis(center.x, box_nw.x, box_se.x, half.x);
    let y = clamp_axis(center.y, box_nw.y, box_se.y, half.y);

    MapView::new(unproject(Point::new(x, y), zoom), zoom)
}

/// View that shows `bounds` with `padding` pixels of margin, clamped.
pub fn fit_view(bounds: &LatLngBounds, size: Size, padding: f64, c: &ViewConstraints) -> MapView {
    let zoom = bounds_zoom(bounds, size, padding, c.zoom_snap);
    let sw = project(bounds.south_west(), 0.0);
    let ne = project(bounds.north_east(), 0.0);
    let mid = Point::new((sw.x + ne.x) / 2.0, (sw.y + ne.y) / 2.0);
    let center = unproject(mid, 0.0);
    clamp_view(MapView::new(center, zoom), size, c)
}

/// Rectangle currently on screen.
pub fn visible_bounds(view: &MapView, size: Size) -> LatLngBounds {
    let c = project(view.center, view.zoom);
    let half = size.half();
    LatLngBounds::new(
        unproject(Point::new(c.x - half.x, c.y + half.y), view.zoom),
        unproject(Point::new(c.x + half.x, c.y - half.y), view.zoom),
    )
}

/// World pixel (at the view's zoom) of the screen's top-left corner.
fn pixel_origin(view: &MapView, size: Size) -> Point {
    project(view.center, view.zoom).sub(size.half())
}

pub fn latlng_to_screen(view: &MapView, size: Size, p: LatLng) -> Point {
    project(p, view.zoom).sub(pixel_origin(view, size))
}

pub fn screen_to_latlng(view: &MapView, size: Size, pt: Point) -> LatLng {
    unproject(pt.add(pixel_origin(view, size)), view.zoom)
}

/// Drag the map by a screen delta (content follows the pointer).
pub fn pan_by(view: &MapView, delta: Point, size: Size, c: &ViewConstraints) -> MapView {
    let center = project(view.center, view.zoom).sub(delta);
    clamp_view(
        MapView::new(unproject(center, view.zoom), view.zoom),
        size,
        c,
    )
}

/// Change zoom keeping the ground under `anchor` (screen pixels) fixed.
pub fn zoom_around(
    view: &MapView,
    zoom: f64,
    anchor: Point,
    size: Size,
    c: &ViewConstraints,
) -> MapView {
    let zoom = zoom.clamp(c.min_zoom, c.max_zoom);
    let ground = screen_to_latlng(view, size, anchor);
    let center = project(ground, zoom).sub(anchor).add(size.half());
    clamp_view(MapView::new(unproject(center, zoom), zoom), size, c)
}

/// Wheel travel, in pixels, worth one zoom level.
const WHEEL_PX_PER_ZOOM_LEVEL: f64 = 60.0;

/// Round to the nearest allowed zoom step.
pub fn snap_zoom(zoom: f64, snap: f64) -> f64 {
    if snap > 0.0 {
        (zoom / snap).round() * snap
    } else {
        zoom
    }
}

/// Target zoom for a wheel movement of `delta_px` (positive zooms out).
/// Always moves at least one snap step so small trackpad deltas still count.
pub fn wheel_zoom(zoom: f64, delta_px: f64, snap: f64) -> f64 {
    if delta_px == 0.0 || !delta_px.is_finite() {
        return zoom;
    }
    let dz = (-delta_px / WHEEL_PX_PER_ZOOM_LEVEL).clamp(-1.0, 1.0);
    let target = snap_zoom(zoom + dz, snap);
    if target != zoom || snap <= 0.0 {
        target
    } else {
        zoom + snap * dz.signum()
    }
}

/// Starting view before any fit: the configured centre and zoom, clamped.
pub fn default_view(config: &MapConfig, size: Size) -> MapView {
    clamp_view(
        MapView::new(config.default_center, config.default_zoom),
        size,
        &ViewConstraints::from(config),
    )
}
