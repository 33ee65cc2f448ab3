mod render;
mod state;

use std::rc::Rc;

use gloo::events::EventListener;
use munro_core::browser::{BrowserEvent, Effect};
use munro_core::config::{MapConfig, OSM_ATTRIBUTION, OSM_COPYRIGHT_URL};
use munro_core::marker::{hit_test, SUMMIT_ICON};
use munro_core::popup::{Popup, LINK_REL, LINK_TARGET};
use munro_core::projection::Point;
use munro_core::types::Munro;
use munro_core::viewport::{pan_by, snap_zoom, wheel_zoom, zoom_around};
use web_sys::{HtmlCanvasElement, HtmlElement, HtmlInputElement};
use yew::prelude::*;

use state::*;

const MUNROS_URL: &str = "/api/munros";

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}

async fn fetch_munros() -> Result<Vec<Munro>, String> {
    let resp = gloo::net::http::Request::get(MUNROS_URL)
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    if !resp.ok() {
        return Err(format!("Munro list unavailable ({})", resp.status()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {e}"))?;
    munro_core::parse_json(text.as_bytes()).map_err(|e| format!("Failed to parse data: {e}"))
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

// ─── App Component ──────────────────────────────────────────────────

#[function_component(App)]
fn app() -> Html {
    let munros: UseStateHandle<Rc<[Munro]>> = use_state(|| Rc::from(Vec::new()));
    let loading = use_state(|| true);

    // Fetch the list on mount. Any failure leaves the map empty.
    {
        let munros = munros.clone();
        let loading = loading.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match fetch_munros().await {
                    Ok(list) => {
                        log::info!("loaded {} munros", list.len());
                        munros.set(Rc::from(list));
                    }
                    Err(e) => log::error!("{e}"),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_point_click = Callback::from(|m: Munro| {
        log::info!("selected {} (#{})", m.name, m.running_no);
    });

    let subtitle = if *loading {
        "Loading munros...".to_string()
    } else {
        format!("{} Scottish mountains over 3,000ft", munros.len())
    };

    html! {
        <div class="app">
            <header class="app-header">
                <h1 class="app-title">{"Munro Mark"}</h1>
                <span class="app-subtitle">{subtitle}</span>
            </header>
            <MunroMap munros={(*munros).clone()} on_point_click={Some(on_point_click)} />
        </div>
    }
}

// ─── Map Component ──────────────────────────────────────────────────

#[derive(Properties)]
pub struct MunroMapProps {
    pub munros: Rc<[Munro]>,
    #[prop_or_default]
    pub on_point_click: Option<Callback<Munro>>,
}

impl PartialEq for MunroMapProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.munros, &other.munros) && self.on_point_click == other.on_point_click
    }
}

#[function_component(MunroMap)]
fn munro_map(props: &MunroMapProps) -> Html {
    let browser = use_reducer(BrowserState::default);
    let map: SharedMap = use_mut_ref(|| None);
    let container_ref = use_node_ref();
    let canvas_ref = use_node_ref();
    // Bumped when the view moves so the popup follows its marker.
    let view_rev = use_state(|| 0u32);

    // Create the canvas state and track window size.
    {
        let map = map.clone();
        let container_ref = container_ref.clone();
        let canvas_ref = canvas_ref.clone();
        use_effect_with((), move |_| {
            let resize = {
                let map = map.clone();
                let container_ref = container_ref.clone();
                move || {
                    let Some(el) = container_ref.cast::<HtmlElement>() else {
                        return;
                    };
                    if let Some(ms) = map.borrow_mut().as_mut() {
                        ms.resize(
                            el.client_width() as f64,
                            el.client_height() as f64,
                            device_pixel_ratio(),
                        );
                        ms.redraw();
                    }
                }
            };

            if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                let ms = MapState::new(canvas, MapConfig::default(), &map);
                *map.borrow_mut() = Some(ms);
                resize();
            } else {
                log::error!("map canvas missing");
            }

            let listener = web_sys::window()
                .map(|w| EventListener::new(&w, "resize", move |_| resize()));
            move || drop(listener)
        });
    }

    // New source list from the host.
    {
        let browser = browser.clone();
        use_effect_with(SourceRef(props.munros.clone()), move |source| {
            browser.dispatch(BrowserEvent::SourceChanged(source.0.clone()));
            || ()
        });
    }

    // Carry out the effects of the last event, then repaint.
    {
        let map = map.clone();
        let state = browser.clone();
        let on_point_click = props.on_point_click.clone();
        use_effect_with(browser.seq, move |_| {
            let effects = state.effects.drain();
            if let Some(ms) = map.borrow_mut().as_mut() {
                for effect in &effects {
                    if let Effect::FitView(bounds) = effect {
                        ms.fit(bounds);
                    }
                }
                let selected = state.browser.selected().map(|m| m.running_no);
                ms.set_markers(state.browser.markers(&SUMMIT_ICON), selected);
                ms.redraw();
            }
            for effect in effects {
                if let Effect::PointClicked(record) = effect {
                    if let Some(cb) = &on_point_click {
                        cb.emit(record);
                    }
                }
            }
            || ()
        });
    }

    let popup_open = browser.browser.popup(&SUMMIT_ICON).is_some();
    let bump_view = {
        let view_rev = view_rev.clone();
        move || {
            if popup_open {
                view_rev.set(*view_rev + 1);
            }
        }
    };

    // ─── Canvas event handlers ──────────────────────────────────────

    let on_wheel = {
        let map = map.clone();
        let bump_view = bump_view.clone();
        Callback::from(move |e: WheelEvent| {
            e.prevent_default();
            if let Some(ms) = map.borrow_mut().as_mut() {
                let mut wheeldelta = e.delta_y();
                if e.delta_mode() == 1 {
                    wheeldelta *= 30.0;
                } else if e.delta_mode() == 2 {
                    wheeldelta *= 300.0;
                }
                let zoom = wheel_zoom(ms.view.zoom, wheeldelta, ms.config.zoom_snap);
                let anchor = Point::new(e.offset_x() as f64, e.offset_y() as f64);
                ms.view = zoom_around(&ms.view, zoom, anchor, ms.size, &ms.constraints);
                ms.redraw();
            }
            bump_view();
        })
    };

    let on_pointerdown = {
        let map = map.clone();
        Callback::from(move |e: PointerEvent| {
            e.prevent_default();
            if let Some(canvas) = e.target_dyn_into::<HtmlElement>() {
                let _ = canvas.set_pointer_capture(e.pointer_id());
            }
            if let Some(ms) = map.borrow_mut().as_mut() {
                ms.pointer_states.insert(
                    e.pointer_id(),
                    PointerState {
                        distance_travelled: 0.0,
                        last_x: e.offset_x() as f64,
                        last_y: e.offset_y() as f64,
                        down_time: js_sys::Date::now(),
                    },
                );
            }
        })
    };

    let on_pointermove = {
        let map = map.clone();
        let bump_view = bump_view.clone();
        Callback::from(move |e: PointerEvent| {
            let mut guard = map.borrow_mut();
            let Some(ms) = guard.as_mut() else {
                return;
            };
            let Some(cur) = ms.pointer_states.get(&e.pointer_id()) else {
                return;
            };
            e.prevent_default();

            let x = e.offset_x() as f64;
            let y = e.offset_y() as f64;
            let (cur_x, cur_y) = (cur.last_x, cur.last_y);
            let other = ms
                .pointer_states
                .iter()
                .find(|(&id, _)| id != e.pointer_id())
                .map(|(_, p)| (p.last_x, p.last_y));

            match (ms.pointer_states.len(), other) {
                (2, Some((ox, oy))) => {
                    // Pinch: pan by centroid movement, then zoom about the new centroid.
                    let old_mid = Point::new((cur_x + ox) / 2.0, (cur_y + oy) / 2.0);
                    let new_mid = Point::new((x + ox) / 2.0, (y + oy) / 2.0);
                    let old_dist = ((cur_x - ox).powi(2) + (cur_y - oy).powi(2)).sqrt();
                    let new_dist = ((x - ox).powi(2) + (y - oy).powi(2)).sqrt();

                    ms.view = pan_by(&ms.view, new_mid.sub(old_mid), ms.size, &ms.constraints);
                    if old_dist > 1.0 && new_dist > 1.0 {
                        let zoom = ms.view.zoom + (new_dist / old_dist).log2();
                        ms.view = zoom_around(&ms.view, zoom, new_mid, ms.size, &ms.constraints);
                    }
                    if let Some(ptr) = ms.pointer_states.get_mut(&e.pointer_id()) {
                        ptr.distance_travelled += 100.0; // never a click
                        ptr.last_x = x;
                        ptr.last_y = y;
                    }
                }
                (1, _) => {
                    let delta = Point::new(x - cur_x, y - cur_y);
                    ms.view = pan_by(&ms.view, delta, ms.size, &ms.constraints);
                    if let Some(ptr) = ms.pointer_states.get_mut(&e.pointer_id()) {
                        ptr.distance_travelled += delta.x.abs() + delta.y.abs();
                        ptr.last_x = x;
                        ptr.last_y = y;
                    }
                }
                _ => return,
            }
            ms.redraw();
            drop(guard);
            bump_view();
        })
    };

    let on_pointerup = {
        let map = map.clone();
        let browser = browser.clone();
        let bump_view = bump_view.clone();
        Callback::from(move |e: PointerEvent| {
            let mut guard = map.borrow_mut();
            let Some(ms) = guard.as_mut() else {
                return;
            };
            let Some(ptr) = ms.pointer_states.remove(&e.pointer_id()) else {
                return;
            };

            if ptr.is_click(js_sys::Date::now()) && e.button() == 0 {
                let pt = Point::new(e.offset_x() as f64, e.offset_y() as f64);
                let hit = hit_test(ms.markers(), &ms.view, ms.size, pt);
                drop(guard);
                match hit {
                    Some(key) => browser.dispatch(BrowserEvent::MarkerClicked(key)),
                    None if popup_open => browser.dispatch(BrowserEvent::PopupClosed),
                    None => {}
                }
                return;
            }

            // Settle a pinch on an allowed zoom step.
            if ms.pointer_states.is_empty() {
                let snapped = snap_zoom(ms.view.zoom, ms.config.zoom_snap);
                if snapped != ms.view.zoom {
                    let centre = ms.size.half();
                    ms.view = zoom_around(&ms.view, snapped, centre, ms.size, &ms.constraints);
                    ms.redraw();
                }
            }
            drop(guard);
            bump_view();
        })
    };

    let on_pointercancel = {
        let map = map.clone();
        Callback::from(move |e: PointerEvent| {
            if let Some(ms) = map.borrow_mut().as_mut() {
                ms.pointer_states.remove(&e.pointer_id());
            }
        })
    };

    // ─── Search panel ───────────────────────────────────────────────

    let on_search = {
        let browser = browser.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            browser.dispatch(BrowserEvent::SearchChanged(input.value()));
        })
    };

    let on_popup_close = {
        let browser = browser.clone();
        Callback::from(move |_: MouseEvent| browser.dispatch(BrowserEvent::PopupClosed))
    };

    // ─── Render ─────────────────────────────────────────────────────

    let popup = browser.browser.popup(&SUMMIT_ICON).and_then(|(marker, popup)| {
        let guard = map.borrow();
        let ms = guard.as_ref()?;
        Some((popup, marker.popup_point(&ms.view, ms.size)))
    });

    let oncontextmenu = Callback::from(|e: MouseEvent| e.prevent_default());

    html! {
        <div class="munro-map">
            <div class="search-panel">
                <input class="search-input" type="search"
                    placeholder="Search by name or region..."
                    value={browser.browser.search_term().to_string()}
                    oninput={on_search} />
                <div class="search-status">{browser.browser.status()}</div>
            </div>
            <div class="map-container" ref={container_ref}>
                <canvas class="map-canvas" ref={canvas_ref}
                    onwheel={on_wheel}
                    onpointerdown={on_pointerdown}
                    onpointermove={on_pointermove}
                    onpointerup={on_pointerup}
                    onpointercancel={on_pointercancel}
                    oncontextmenu={oncontextmenu}>
                </canvas>
                if let Some((popup, at)) = popup {
                    <PopupCard {popup} {at} on_close={on_popup_close} />
                }
                <div class="map-attribution">
                    <a href={OSM_COPYRIGHT_URL} target={LINK_TARGET} rel={LINK_REL}>
                        {OSM_ATTRIBUTION}
                    </a>
                </div>
            </div>
        </div>
    }
}

// ─── Popup ──────────────────────────────────────────────────────────

#[derive(Properties, PartialEq)]
struct PopupCardProps {
    popup: Popup,
    /// Screen position of the popup tip.
    at: Point,
    on_close: Callback<MouseEvent>,
}

#[function_component(PopupCard)]
fn popup_card(props: &PopupCardProps) -> Html {
    let p = &props.popup;
    let style = format!("left: {}px; top: {}px;", props.at.x, props.at.y);
    // Keep drags that start on the card from reaching the map.
    let stop = Callback::from(|e: PointerEvent| e.stop_propagation());

    html! {
        <div class="popup" {style} onpointerdown={stop}>
            <button class="popup-close" onclick={props.on_close.clone()}>{"×"}</button>
            <h3 class="popup-title">{&p.title}</h3>
            <div class="popup-height">{&p.height}</div>
            <span class={p.badge.css_class()}>{&p.classification}</span>
            <div class="popup-row">
                <span class="popup-label">{"Section: "}</span>{&p.smc_section}
            </div>
            <div class="popup-row">
                <span class="popup-label">{"Grid Ref: "}</span>
                <span class="mono">{&p.grid_ref}</span>
            </div>
            if let Some(comments) = &p.comments {
                <div class="popup-comments">{comments}</div>
            }
            if !p.links.is_empty() {
                <div class="popup-links">
                    {for p.links.iter().map(|l| html! {
                        <a class={l.kind.css_class()} href={l.url.clone()}
                            target={LINK_TARGET} rel={LINK_REL}>
                            {l.kind.label()}
                        </a>
                    })}
                </div>
            }
        </div>
    }
}
