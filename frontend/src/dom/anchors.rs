use log::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent, ScrollBehavior, ScrollToOptions, Window};

use crate::dom::element::query_all;
use crate::error::PageError;

const IN_PAGE_LINKS: &str = "a[href^=\"#\"]";

/// In-page fragment worth scrolling to. A bare `#` is left to the browser.
pub fn fragment(href: &str) -> Option<&str> {
    (href.len() > 1 && href.starts_with('#')).then_some(href)
}

/// Document offset that lands `target` just below a fixed navbar.
pub fn scroll_top(target_top: f64, scroll_y: f64, nav_height: f64) -> f64 {
    target_top + scroll_y - nav_height
}

/// Replaces the jump to in-page anchors with a scroll that accounts for the
/// navbar height. Returns how many links were wired.
pub fn wire_smooth_scroll(
    window: &Window,
    document: &Document,
    nav: Option<Element>,
    reduced_motion: bool,
) -> Result<usize, PageError> {
    let links = query_all(document, IN_PAGE_LINKS);
    let behavior = if reduced_motion {
        ScrollBehavior::Auto
    } else {
        ScrollBehavior::Smooth
    };

    for link in &links {
        let on_click = {
            let window = window.clone();
            let document = document.clone();
            let nav = nav.clone();
            let link = link.clone();
            Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
                let Some(href) = link.get_attribute("href") else {
                    return;
                };
                let Some(selector) = fragment(&href) else {
                    return;
                };
                // Fragments that are not valid selectors fall through to the default jump.
                let Some(target) = document.query_selector(selector).ok().flatten() else {
                    debug!("No target for {}", selector);
                    return;
                };

                event.prevent_default();
                let nav_height = nav
                    .as_ref()
                    .and_then(|nav| nav.dyn_ref::<HtmlElement>())
                    .map(|nav| f64::from(nav.offset_height()))
                    .unwrap_or(0.0);
                let top = scroll_top(
                    target.get_bounding_client_rect().top(),
                    window.scroll_y().unwrap_or(0.0),
                    nav_height,
                );

                let options = ScrollToOptions::new();
                options.set_top(top);
                options.set_behavior(behavior);
                window.scroll_to_with_scroll_to_options(&options);
            })
        };
        link.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    Ok(links.len())
}
