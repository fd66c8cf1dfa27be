use log::{info, warn};
use serde::Deserialize;
use web_sys::Document;

use crate::error::PageError;
use crate::reveal::profile::Profile;
use crate::reveal::scheduler::GroupSpec;
use crate::reveal::timeline::{Role, Timeline};

/// Id of the optional `<script type="application/json">` block that overrides defaults.
pub const CONFIG_ELEMENT_ID: &str = "steady-config";

/// Everything the page needs, built once at startup. Every field has a
/// default so a page override only has to name what it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub nav: NavConfig,
    pub observer: ObserverOptions,
    pub fallback_ms: u32,
    /// Class the page puts on `<html>` before the script loads to keep
    /// revealable content hidden; removed once groups are registered.
    pub pending_class: String,
    pub groups: Vec<GroupConfig>,
    pub diagram: Option<DiagramConfig>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            nav: NavConfig::default(),
            observer: ObserverOptions::default(),
            fallback_ms: 3_500,
            pending_class: "reveal-pending".to_string(),
            groups: vec![
                GroupConfig::new("value cards", ".value-card"),
                GroupConfig::new("blog cards", ".blog-card"),
            ],
            diagram: Some(DiagramConfig::default()),
        }
    }
}

impl PageConfig {
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        let config: PageConfig = serde_json::from_str(raw)?;
        Ok(config.normalized())
    }

    /// Reads the page's JSON override if there is one. A broken override is
    /// logged and ignored so the page still gets its behavior.
    pub fn from_document(document: &Document) -> Self {
        let raw = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|element| element.text_content());

        match raw {
            Some(raw) => match Self::from_json(&raw) {
                Ok(config) => {
                    info!("Loaded page config from #{}", CONFIG_ELEMENT_ID);
                    config
                }
                Err(err) => {
                    warn!("Ignoring page config: {}", err);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.observer.threshold = if self.observer.threshold.is_finite() {
            self.observer.threshold.clamp(0.0, 1.0)
        } else {
            ObserverOptions::default().threshold
        };
        if !self.nav.scroll_threshold_px.is_finite() {
            self.nav.scroll_threshold_px = NavConfig::default().scroll_threshold_px;
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavConfig {
    pub nav_id: String,
    pub toggle_id: String,
    pub menu_id: String,
    pub scrolled_class: String,
    pub open_class: String,
    pub active_class: String,
    pub scroll_threshold_px: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            nav_id: "nav".to_string(),
            toggle_id: "navToggle".to_string(),
            menu_id: "navMobile".to_string(),
            scrolled_class: "scrolled".to_string(),
            open_class: "open".to_string(),
            active_class: "active".to_string(),
            scroll_threshold_px: 10.0,
        }
    }
}

/// Viewport monitoring options, named after their `IntersectionObserver` counterparts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible, in [0, 1].
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            root_margin: "80px 0px 0px 0px".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupConfig {
    pub name: String,
    pub selector: String,
    pub profile: Profile,
    pub stagger_ms: u32,
    /// Restart stagger order for each parent container.
    pub per_parent: bool,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "group".to_string(),
            selector: String::new(),
            profile: Profile::FadeUp,
            stagger_ms: 100,
            per_parent: true,
        }
    }
}

impl GroupConfig {
    pub fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            ..Self::default()
        }
    }

    pub fn spec(&self) -> GroupSpec {
        GroupSpec {
            name: self.name.clone(),
            profile: self.profile,
            stagger_ms: self.stagger_ms,
        }
    }
}

/// Hub-and-spoke diagram: `root` is the trigger and receives the container
/// phase; the other selectors are resolved inside it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
    pub root: String,
    pub lines: String,
    pub hub: String,
    pub cards: String,
    pub badge: String,
    pub caption: String,
    pub timeline: Timeline,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            root: ".hub-diagram".to_string(),
            lines: ".spoke-line".to_string(),
            hub: ".hub-core".to_string(),
            cards: ".spoke-card".to_string(),
            badge: ".hub-badge".to_string(),
            caption: ".hub-caption".to_string(),
            timeline: Timeline::diagram(),
        }
    }
}

impl DiagramConfig {
    /// Selector for a role's elements inside the root. The container role is the root itself.
    pub fn selector(&self, role: Role) -> Option<&str> {
        match role {
            Role::Lines => Some(&self.lines),
            Role::Hub => Some(&self.hub),
            Role::Cards => Some(&self.cards),
            Role::Badge => Some(&self.badge),
            Role::Caption => Some(&self.caption),
            Role::Container => None,
        }
    }

    /// Stand-in group for the cards when the diagram root is missing from the page.
    pub fn cards_group(&self) -> GroupConfig {
        GroupConfig {
            profile: Profile::DiagramNode,
            stagger_ms: self
                .timeline
                .phase(Role::Cards)
                .map(|phase| phase.stagger_ms)
                .unwrap_or(GroupConfig::default().stagger_ms),
            ..GroupConfig::new("diagram cards", &self.cards)
        }
    }
}
