//! State of the point browser and its event transitions.
//!
//! The browser owns the search term and the filtered subset derived from it.
//! Every input is an [`BrowserEvent`]; [`Browser::apply`] returns the next
//! state together with the side effects the host must carry out (fit the view,
//! notify the click listener). Nothing here touches the DOM.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::filter::filter_indices;
use crate::marker::{markers, Marker, MarkerIcon};
use crate::popup::Popup;
use crate::types::{LatLngBounds, Munro};
use crate::viewport::fit;

#[derive(Debug, Clone)]
pub enum BrowserEvent {
    /// A new source list arrived from the host.
    SourceChanged(Rc<[Munro]>),
    SearchChanged(String),
    /// A marker was clicked, identified by `running_no`.
    MarkerClicked(u32),
    PopupClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fit the live view to these bounds.
    FitView(LatLngBounds),
    /// Forward the clicked record to the host.
    PointClicked(Munro),
}

/// Effects waiting for the host, shared between successive browser states.
/// Every transition appends; the host drains once per render, so events
/// reduced together before a render are all carried out in order.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue(Rc<RefCell<VecDeque<Effect>>>);

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, effects: Vec<Effect>) {
        self.0.borrow_mut().extend(effects);
    }

    pub fn drain(&self) -> Vec<Effect> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Browser {
    source: Rc<[Munro]>,
    search_term: String,
    filtered: Vec<usize>,
    selected: Option<u32>,
    open_popup: Option<u32>,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new(Rc::from(Vec::new()))
    }
}

impl PartialEq for Browser {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
            && self.search_term == other.search_term
            && self.filtered == other.filtered
            && self.selected == other.selected
            && self.open_popup == other.open_popup
    }
}

impl Browser {
    /// Fresh state for a mounted map: empty search, everything shown.
    pub fn new(source: Rc<[Munro]>) -> Self {
        let filtered = filter_indices(&source, "");
        Self {
            source,
            search_term: String::new(),
            filtered,
            selected: None,
            open_popup: None,
        }
    }

    /// Next state and effects for `event`.
    pub fn apply(&self, event: BrowserEvent) -> (Browser, Vec<Effect>) {
        let mut next = self.clone();
        let mut effects = Vec::new();

        match event {
            BrowserEvent::SourceChanged(source) => {
                next.source = source;
                next.refilter();
                // The selection refers to the old list; keep it only if the
                // record still exists.
                if let Some(no) = next.selected {
                    if next.find(no).is_none() {
                        next.selected = None;
                    }
                }
                effects.extend(next.fit().map(Effect::FitView));
            }
            BrowserEvent::SearchChanged(term) => {
                next.search_term = term;
                if next.refilter() {
                    effects.extend(next.fit().map(Effect::FitView));
                }
            }
            BrowserEvent::MarkerClicked(no) => {
                if let Some(record) = next.find(no).cloned() {
                    next.selected = Some(no);
                    next.open_popup = Some(no);
                    effects.push(Effect::PointClicked(record));
                } else {
                    log::warn!("click on unknown munro {no}");
                }
            }
            BrowserEvent::PopupClosed => {
                next.open_popup = None;
            }
        }

        (next, effects)
    }

    /// Recompute the filtered subset; returns whether it changed.
    fn refilter(&mut self) -> bool {
        let filtered = filter_indices(&self.source, &self.search_term);
        let changed = filtered != self.filtered;
        self.filtered = filtered;
        if let Some(no) = self.open_popup {
            if !self.is_visible(no) {
                self.open_popup = None;
            }
        }
        changed
    }

    fn find(&self, running_no: u32) -> Option<&Munro> {
        self.source.iter().find(|m| m.running_no == running_no)
    }

    fn is_visible(&self, running_no: u32) -> bool {
        self.filtered
            .iter()
            .map(|&i| &self.source[i])
            .any(|m| m.running_no == running_no && m.has_valid_position())
    }

    pub fn source(&self) -> &Rc<[Munro]> {
        &self.source
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Filtered records in source order.
    pub fn filtered(&self) -> impl Iterator<Item = &Munro> + '_ {
        self.filtered.iter().map(move |&i| &self.source[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Status line for the search panel.
    pub fn status(&self) -> String {
        format!(
            "Showing {} of {} munros",
            self.filtered_len(),
            self.source_len()
        )
    }

    /// The last clicked record. Survives filtering.
    pub fn selected(&self) -> Option<&Munro> {
        self.selected.and_then(|no| self.find(no))
    }

    /// Bounds of the filtered records with usable coordinates.
    pub fn fit(&self) -> Option<LatLngBounds> {
        fit(self.filtered())
    }

    pub fn markers(&self, icon: &MarkerIcon) -> Vec<Marker> {
        markers(&self.source, &self.filtered, icon)
    }

    /// Marker and content of the open popup, if its marker is on the map.
    pub fn popup(&self, icon: &MarkerIcon) -> Option<(Marker, Popup)> {
        let no = self.open_popup?;
        let record = self.find(no)?;
        let marker = self.markers(icon).into_iter().find(|m| m.key == no)?;
        Some((marker, Popup::from_record(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::SUMMIT_ICON;

    fn hill(no: u32, name: &str, lat: f64, lng: f64) -> Munro {
        Munro {
            running_no: no,
            name: name.to_string(),
            smc_section: format!("Section {no}"),
            latitude: lat,
            longitude: lng,
            classification: "Munro".to_string(),
            ..Munro::default()
        }
    }

    fn source() -> Rc<[Munro]> {
        Rc::from(vec![
            hill(1, "Ben Nevis", 56.7969, -5.0036),
            hill(2, "Ben Lomond", 56.1903, -4.6330),
            hill(3, "Schiehallion", 56.6664, -4.1006),
        ])
    }

    fn names(b: &Browser) -> Vec<String> {
        b.filtered().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn test_queue_keeps_effects_of_batched_events() {
        let queue = EffectQueue::new();
        let b = Browser::default();

        let (b, effects) = b.apply(BrowserEvent::SourceChanged(source()));
        queue.extend(effects);
        let (_, effects) = b.apply(BrowserEvent::MarkerClicked(2));
        queue.extend(effects);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Effect::FitView(_)));
        assert!(matches!(&drained[1], Effect::PointClicked(m) if m.running_no == 2));
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_new_shows_everything() {
        let b = Browser::new(source());
        assert_eq!(b.filtered_len(), 3);
        assert_eq!(b.source_len(), 3);
        assert_eq!(b.status(), "Showing 3 of 3 munros");
        assert_eq!(b.markers(&SUMMIT_ICON).len(), 3);
    }

    #[test]
    fn test_search_ben() {
        let b = Browser::new(source());
        let (b, effects) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        assert_eq!(names(&b), vec!["Ben Nevis", "Ben Lomond"]);
        assert_eq!(b.status(), "Showing 2 of 3 munros");
        assert!(matches!(effects.as_slice(), [Effect::FitView(_)]));
    }

    #[test]
    fn test_fit_follows_filter() {
        let b = Browser::new(source());
        let (b, effects) = b.apply(BrowserEvent::SearchChanged("schie".into()));
        let Effect::FitView(bounds) = effects[0] else {
            panic!("expected a fit");
        };
        assert_eq!(bounds.south, 56.6664);
        assert_eq!(bounds.north, 56.6664);
        assert_eq!(b.fit(), Some(bounds));
    }

    #[test]
    fn test_unchanged_filter_does_not_refit() {
        let b = Browser::new(source());
        let (b, _) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        let (b, effects) = b.apply(BrowserEvent::SearchChanged("ben ".into()));
        // same two hills, so the view stays put
        assert_eq!(b.filtered_len(), 2);
        assert!(effects.is_empty());
        let (_, effects) = b.apply(BrowserEvent::SearchChanged("ben n".into()));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_no_match_leaves_view_alone() {
        let b = Browser::new(source());
        let (b, effects) = b.apply(BrowserEvent::SearchChanged("zzz".into()));
        assert_eq!(b.filtered_len(), 0);
        assert_eq!(b.status(), "Showing 0 of 3 munros");
        assert!(effects.is_empty());
        assert!(b.markers(&SUMMIT_ICON).is_empty());
    }

    #[test]
    fn test_empty_source() {
        let b = Browser::default();
        assert_eq!(b.status(), "Showing 0 of 0 munros");
        assert!(b.markers(&SUMMIT_ICON).is_empty());
        assert!(b.fit().is_none());
        let (b, effects) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        assert!(effects.is_empty());
        assert_eq!(b.filtered_len(), 0);
        let (_, effects) = b.apply(BrowserEvent::SourceChanged(Rc::from(Vec::new())));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_source_change_reapplies_search() {
        let b = Browser::default();
        let (b, _) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        let (b, effects) = b.apply(BrowserEvent::SourceChanged(source()));
        assert_eq!(names(&b), vec!["Ben Nevis", "Ben Lomond"]);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_click_emits_record_once() {
        let src = source();
        let b = Browser::new(src.clone());
        let (b, effects) = b.apply(BrowserEvent::MarkerClicked(2));
        assert_eq!(effects, vec![Effect::PointClicked(src[1].clone())]);
        assert_eq!(b.selected(), Some(&src[1]));
        let (marker, popup) = b.popup(&SUMMIT_ICON).unwrap();
        assert_eq!(marker.key, 2);
        assert_eq!(popup.title, "Ben Lomond");
    }

    #[test]
    fn test_click_unknown_is_inert() {
        let b = Browser::new(source());
        let (b, effects) = b.apply(BrowserEvent::MarkerClicked(99));
        assert!(effects.is_empty());
        assert!(b.selected().is_none());
    }

    #[test]
    fn test_selection_survives_filtering() {
        let b = Browser::new(source());
        let (b, _) = b.apply(BrowserEvent::MarkerClicked(3));
        let (b, _) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        assert_eq!(b.selected().map(|m| m.running_no), Some(3));
        // its marker is hidden, so is its popup
        assert!(b.popup(&SUMMIT_ICON).is_none());
    }

    #[test]
    fn test_popup_close_keeps_selection() {
        let b = Browser::new(source());
        let (b, _) = b.apply(BrowserEvent::MarkerClicked(1));
        let (b, effects) = b.apply(BrowserEvent::PopupClosed);
        assert!(effects.is_empty());
        assert!(b.popup(&SUMMIT_ICON).is_none());
        assert_eq!(b.selected().map(|m| m.running_no), Some(1));
    }

    #[test]
    fn test_invalid_coordinates_still_counted() {
        let src: Rc<[Munro]> = Rc::from(vec![
            hill(1, "Ben Nevis", 56.7969, -5.0036),
            hill(2, "Ben Phantom", f64::NAN, -4.0),
        ]);
        let b = Browser::new(src);
        let (b, _) = b.apply(BrowserEvent::SearchChanged("ben".into()));
        assert_eq!(b.filtered_len(), 2);
        assert_eq!(b.markers(&SUMMIT_ICON).len(), 1);
        let bounds = b.fit().unwrap();
        assert_eq!(bounds.south, 56.7969);
    }
}
