use std::cell::Cell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use gloo::events::EventListener;
use munro_core::marker::Marker;
use munro_core::projection::Size;
use munro_core::tiles::{PlacedTile, TileId, TileLru};
use munro_core::viewport::MapView;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Path2d};

const BACKGROUND: &str = "#e5e3df";
const MARKER_OUTLINE: &str = "#ffffff";
/// Least recently drawn tiles are dropped past this count.
const MAX_CACHED_TILES: usize = 256;

// ─── Tile cache ─────────────────────────────────────────────────────

struct TileEntry {
    img: HtmlImageElement,
    failed: Rc<Cell<bool>>,
    _listeners: [EventListener; 2],
}

impl TileEntry {
    fn ready(&self) -> bool {
        !self.failed.get() && self.img.complete() && self.img.natural_width() > 0
    }
}

/// Base-map images keyed by tile. A tile that fails to load stays blank.
pub struct TileCache {
    entries: HashMap<TileId, TileEntry>,
    lru: TileLru,
}

impl TileCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: TileLru::new(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.lru.begin_frame();
    }

    /// The image for `id` if it has finished loading. Starts the request
    /// otherwise; `on_load` runs once it completes.
    pub fn get_or_load(
        &mut self,
        id: TileId,
        url: &str,
        on_load: &Rc<dyn Fn()>,
    ) -> Option<&HtmlImageElement> {
        self.lru.touch(id);
        if !self.entries.contains_key(&id) {
            let img = HtmlImageElement::new().ok()?;
            let failed = Rc::new(Cell::new(false));

            let cb = on_load.clone();
            let load = EventListener::once(&img, "load", move |_| cb());
            let flag = failed.clone();
            let error = EventListener::once(&img, "error", move |_| {
                flag.set(true);
                log::debug!("tile {} failed to load", id.key());
            });
            img.set_src(url);

            self.entries.insert(
                id,
                TileEntry {
                    img,
                    failed,
                    _listeners: [load, error],
                },
            );
        }
        self.entries
            .get(&id)
            .filter(|e| e.ready())
            .map(|e| &e.img)
    }

    /// Drop images not drawn recently once the cache grows large.
    pub fn prune(&mut self) {
        for id in self.lru.evict(MAX_CACHED_TILES) {
            self.entries.remove(&id);
        }
    }
}

// ─── Canvas ─────────────────────────────────────────────────────────

pub fn get_ctx(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()??
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()
}

/// Size the backing store for the device pixel ratio; drawing stays in CSS pixels.
pub fn prepare_canvas(canvas: &HtmlCanvasElement, size: Size, dpr: f64) {
    canvas.set_width((size.width * dpr) as u32);
    canvas.set_height((size.height * dpr) as u32);
    let _ = canvas
        .style()
        .set_property("width", &format!("{}px", size.width));
    let _ = canvas
        .style()
        .set_property("height", &format!("{}px", size.height));
}

pub fn clear_canvas(ctx: &CanvasRenderingContext2d, size: Size, dpr: f64) {
    let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, size.width, size.height);
}

/// Draw whatever tiles are ready; the rest are requested.
pub fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    tiles: &[PlacedTile],
    cache: &mut TileCache,
    url_template: &str,
    subdomains: &[String],
    on_load: &Rc<dyn Fn()>,
) {
    for tile in tiles {
        let url = tile.id.url(url_template, subdomains);
        if let Some(img) = cache.get_or_load(tile.id, &url, on_load) {
            // Half-pixel overlap hides seams between scaled tiles.
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                tile.origin.x.floor(),
                tile.origin.y.floor(),
                tile.size.ceil() + 0.5,
                tile.size.ceil() + 0.5,
            );
        }
    }
}

fn draw_marker(
    ctx: &CanvasRenderingContext2d,
    marker: &Marker,
    view: &MapView,
    size: Size,
    fill: &str,
) {
    let (top_left, _) = marker.screen_rect(view, size);
    let icon = &marker.icon;
    let Ok(path) = Path2d::new_with_path_string(icon.path) else {
        return;
    };

    ctx.save();
    let _ = ctx.translate(top_left.x, top_left.y);
    ctx.set_fill_style_str(fill);
    ctx.fill_with_path_2d(&path);
    ctx.set_stroke_style_str(MARKER_OUTLINE);
    ctx.set_line_width(1.0);
    ctx.stroke_with_path(&path);

    let (cx, cy, r) = icon.dot;
    ctx.begin_path();
    let _ = ctx.arc(cx, cy, r, 0.0, 2.0 * PI);
    ctx.fill();
    ctx.restore();
}

/// Markers in list order, matching hit testing: later ones sit on top.
pub fn draw_markers(
    ctx: &CanvasRenderingContext2d,
    markers: &[Marker],
    view: &MapView,
    size: Size,
    selected: Option<u32>,
) {
    for m in markers {
        let fill = if Some(m.key) == selected {
            m.icon.selected_fill
        } else {
            m.icon.fill
        };
        draw_marker(ctx, m, view, size, fill);
    }
}
