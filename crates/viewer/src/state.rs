use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use munro_core::browser::{Browser, BrowserEvent, EffectQueue};
use munro_core::config::MapConfig;
use munro_core::marker::Marker;
use munro_core::projection::Size;
use munro_core::tiles::visible_tiles;
use munro_core::types::{LatLngBounds, Munro};
use munro_core::viewport::{clamp_view, default_view, fit_view, MapView, ViewConstraints};
use web_sys::HtmlCanvasElement;
use yew::Reducible;

use crate::render::{self, TileCache};

// ─── Browser reducer ────────────────────────────────────────────────

/// Browser state plus the queue of effects its transitions produced. `seq`
/// bumps on every event so the effect hook runs after each render that
/// follows one; the hook drains whatever has queued up since.
#[derive(Default)]
pub struct BrowserState {
    pub browser: Browser,
    pub effects: EffectQueue,
    pub seq: u64,
}

impl Reducible for BrowserState {
    type Action = BrowserEvent;

    fn reduce(self: Rc<Self>, action: BrowserEvent) -> Rc<Self> {
        let (browser, effects) = self.browser.apply(action);
        self.effects.extend(effects);
        Rc::new(BrowserState {
            browser,
            effects: self.effects.clone(),
            seq: self.seq + 1,
        })
    }
}

/// Source list compared by identity. Records may hold NaN coordinates, which
/// never compare equal by value.
#[derive(Clone)]
pub struct SourceRef(pub Rc<[Munro]>);

impl PartialEq for SourceRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// ─── Map canvas state ───────────────────────────────────────────────

pub struct PointerState {
    pub distance_travelled: f64,
    pub last_x: f64,
    pub last_y: f64,
    pub down_time: f64,
}

impl PointerState {
    /// Short and nearly still: a click rather than a drag.
    pub fn is_click(&self, now: f64) -> bool {
        self.distance_travelled < 10.0 && now - self.down_time <= 500.0
    }
}

pub type SharedMap = Rc<RefCell<Option<MapState>>>;

pub struct MapState {
    canvas: HtmlCanvasElement,
    pub config: MapConfig,
    pub constraints: ViewConstraints,
    pub view: MapView,
    pub size: Size,
    dpr: f64,
    tiles: TileCache,
    markers: Vec<Marker>,
    selected: Option<u32>,
    /// Fit requested before the canvas had a size.
    pending_fit: Option<LatLngBounds>,
    pub pointer_states: HashMap<i32, PointerState>,
    me: Weak<RefCell<Option<MapState>>>,
}

impl MapState {
    pub fn new(canvas: HtmlCanvasElement, config: MapConfig, me: &SharedMap) -> Self {
        let constraints = ViewConstraints::from(&config);
        let size = Size::new(0.0, 0.0);
        Self {
            canvas,
            view: default_view(&config, size),
            constraints,
            config,
            size,
            dpr: 1.0,
            tiles: TileCache::new(),
            markers: Vec::new(),
            selected: None,
            pending_fit: None,
            pointer_states: HashMap::new(),
            me: Rc::downgrade(me),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        self.size = Size::new(width, height);
        self.dpr = dpr;
        render::prepare_canvas(&self.canvas, self.size, dpr);
        if self.size.is_empty() {
            return;
        }
        match self.pending_fit.take() {
            Some(bounds) => self.fit(&bounds),
            None => self.view = clamp_view(self.view, self.size, &self.constraints),
        }
    }

    pub fn fit(&mut self, bounds: &LatLngBounds) {
        if self.size.is_empty() {
            self.pending_fit = Some(*bounds);
            return;
        }
        self.view = fit_view(bounds, self.size, self.config.fit_padding, &self.constraints);
        log::debug!(
            "fit view to {:.4},{:.4} at zoom {}",
            self.view.center.lat,
            self.view.center.lng,
            self.view.zoom
        );
    }

    pub fn set_markers(&mut self, markers: Vec<Marker>, selected: Option<u32>) {
        self.markers = markers;
        self.selected = selected;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn redraw(&mut self) {
        if self.size.is_empty() {
            return;
        }
        let Some(ctx) = render::get_ctx(&self.canvas) else {
            log::error!("canvas has no 2d context");
            return;
        };

        let me = self.me.clone();
        let on_load: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(shared) = me.upgrade() {
                if let Ok(mut guard) = shared.try_borrow_mut() {
                    if let Some(ms) = guard.as_mut() {
                        ms.redraw();
                    }
                }
            }
        });

        self.tiles.begin_frame();
        let placed = visible_tiles(&self.view, self.size, self.config.max_zoom);

        render::clear_canvas(&ctx, self.size, self.dpr);
        render::draw_tiles(
            &ctx,
            &placed,
            &mut self.tiles,
            &self.config.tile_url,
            &self.config.tile_subdomains,
            &on_load,
        );
        self.tiles.prune();
        render::draw_markers(&ctx, &self.markers, &self.view, self.size, self.selected);
    }
}
