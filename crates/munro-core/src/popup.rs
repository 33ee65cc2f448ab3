//! Structured content of the detail popup shown for a clicked summit.

use crate::types::Munro;

/// Links open in a fresh browsing context with no handle back to this page.
pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

const PRIMARY_CLASSIFICATION: &str = "Munro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Primary,
    Secondary,
}

impl Badge {
    pub fn for_classification(classification: &str) -> Self {
        if classification == PRIMARY_CLASSIFICATION {
            Badge::Primary
        } else {
            Badge::Secondary
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Badge::Primary => "badge badge-primary",
            Badge::Secondary => "badge badge-secondary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    StreetMap,
    Photos,
    HillBagging,
}

impl LinkKind {
    pub fn label(&self) -> &'static str {
        match self {
            LinkKind::StreetMap => "Street Map",
            LinkKind::Photos => "Photos",
            LinkKind::HillBagging => "Hill Bagging",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            LinkKind::StreetMap => "link-btn link-streetmap",
            LinkKind::Photos => "link-btn link-photos",
            LinkKind::HillBagging => "link-btn link-hillbagging",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub kind: LinkKind,
    pub url: String,
}

/// Popup payload. Field order is display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub height: String,
    pub classification: String,
    pub badge: Badge,
    pub smc_section: String,
    pub grid_ref: String,
    /// Present only for a non-empty comment.
    pub comments: Option<String>,
    /// Zero to three links, each only when its URL is set.
    pub links: Vec<ExternalLink>,
}

impl Popup {
    pub fn from_record(m: &Munro) -> Self {
        let links = [
            (LinkKind::StreetMap, &m.streetmap_url),
            (LinkKind::Photos, &m.geograph_url),
            (LinkKind::HillBagging, &m.hill_bagging_url),
        ]
        .into_iter()
        .filter(|(_, url)| !url.is_empty())
        .map(|(kind, url)| ExternalLink {
            kind,
            url: url.clone(),
        })
        .collect();

        Self {
            title: m.name.clone(),
            height: format_height(m.height_m, m.height_ft),
            classification: m.classification.clone(),
            badge: Badge::for_classification(&m.classification),
            smc_section: m.smc_section.clone(),
            grid_ref: m.grid_ref.clone(),
            comments: (!m.comments.is_empty()).then(|| m.comments.clone()),
            links,
        }
    }
}

/// `1344.5, 4411` → `"1344.5m (4,411ft)"`.
pub fn format_height(height_m: f64, height_ft: u32) -> String {
    format!("{height_m:.1}m ({}ft)", group_thousands(height_ft))
}

/// Comma-separated thousands.
pub fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
