use log::{debug, info, warn};
use web_sys::{Document, Element};

use crate::config::{DiagramConfig, GroupConfig, PageConfig};
use crate::dom::anchors;
use crate::dom::element::{by_id, query_all, query_all_within, query_one};
use crate::dom::nav;
use crate::dom::timers::BrowserTimers;
use crate::dom::viewport::{prefers_reduced_motion, IntersectionMonitor};
use crate::error::PageError;
use crate::reveal::scheduler::{GroupId, Motion, RevealScheduler, Surface};
use crate::reveal::timeline::sibling_runs;

type Scheduler = RevealScheduler<Element, BrowserTimers>;

/// Wires every interaction on the landing page. Each piece is optional:
/// anything missing from the markup is skipped and the rest still runs.
pub fn start() -> Result<(), PageError> {
    let window = web_sys::window().ok_or(PageError::NoWindow)?;
    let document = window.document().ok_or(PageError::NoDocument)?;
    let config = PageConfig::from_document(&document);
    let reduced_motion = prefers_reduced_motion(&window);

    let motion = if reduced_motion { Motion::Reduced } else { Motion::Full };
    let scheduler = RevealScheduler::new(BrowserTimers, motion);
    let groups = register_groups(&scheduler, &document, &config);
    if let Some(root) = document.document_element() {
        lift_prehide(&root, &config.pending_class);
    }

    scheduler.arm_fallback(config.fallback_ms);
    let monitor = IntersectionMonitor::new(window.clone());
    for group in &groups {
        scheduler.observe(*group, &monitor, &config.observer);
    }
    let tally = scheduler.tally();
    info!(
        "Reveal scheduler: {} groups, {} pending, {} revealed, fallback in {}ms{}",
        groups.len(),
        tally.pending + tally.observed,
        tally.revealed,
        config.fallback_ms,
        if reduced_motion { " (reduced motion)" } else { "" }
    );

    let nav_element = by_id(&document, &config.nav.nav_id);
    match &nav_element {
        Some(nav_element) => {
            if let Err(err) = nav::wire_scroll_state(&window, nav_element, &config.nav) {
                warn!("Navbar scroll state unavailable: {}", err);
            }
        }
        None => debug!("No #{} element, skipping navbar scroll state", config.nav.nav_id),
    }

    match (
        by_id(&document, &config.nav.toggle_id),
        by_id(&document, &config.nav.menu_id),
    ) {
        (Some(toggle), Some(menu)) => {
            if let Err(err) = nav::wire_mobile_menu(&toggle, &menu, &config.nav) {
                warn!("Mobile menu unavailable: {}", err);
            }
        }
        _ => debug!("No mobile menu in markup, skipping toggle"),
    }

    match anchors::wire_smooth_scroll(&window, &document, nav_element, reduced_motion) {
        Ok(count) => debug!("Smooth scrolling wired for {} anchor links", count),
        Err(err) => warn!("Smooth scrolling unavailable: {}", err),
    }

    Ok(())
}

fn register_groups(scheduler: &Scheduler, document: &Document, config: &PageConfig) -> Vec<GroupId> {
    let mut groups = Vec::new();

    if let Some(diagram) = &config.diagram {
        match query_one(document, &diagram.root) {
            Some(root) => groups.extend(register_diagram(scheduler, root, diagram)),
            None => {
                debug!("No {} in markup, revealing diagram cards individually", diagram.root);
                groups.extend(register_group(scheduler, document, &diagram.cards_group()));
            }
        }
    }

    for group in &config.groups {
        groups.extend(register_group(scheduler, document, group));
    }

    groups
}

fn register_diagram(scheduler: &Scheduler, root: Element, diagram: &DiagramConfig) -> Option<GroupId> {
    let tracks = diagram
        .timeline
        .phases
        .iter()
        .map(|phase| {
            let elements = match diagram.selector(phase.role) {
                Some(selector) => query_all_within(&root, selector),
                None => vec![root.clone()],
            };
            if elements.is_empty() {
                debug!("Diagram has no {:?} elements, skipping phase", phase.role);
            }
            (phase, elements)
        })
        .collect();

    scheduler.register_timeline("diagram", root, tracks)
}

fn register_group(scheduler: &Scheduler, document: &Document, group: &GroupConfig) -> Vec<GroupId> {
    let elements = query_all(document, &group.selector);
    let runs = if group.per_parent {
        sibling_runs(elements, |element| element.parent_element())
    } else {
        vec![elements]
    };

    let spec = group.spec();
    runs.into_iter()
        .filter_map(|run| scheduler.register(&spec, run))
        .collect()
}

/// Hands hiding over from the page-level class to each element's own
/// hidden state. Must run after registration.
fn lift_prehide<S: Surface>(root: &S, class: &str) {
    if !class.is_empty() {
        root.remove_class(class);
    }
}
