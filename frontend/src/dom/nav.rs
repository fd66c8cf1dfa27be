use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Element, Window};

use crate::config::NavConfig;
use crate::dom::element::query_all_within;
use crate::error::PageError;
use crate::reveal::scheduler::Surface;

pub fn is_scrolled(scroll_y: f64, threshold_px: f64) -> bool {
    scroll_y > threshold_px
}

/// Keeps the scrolled class on the navbar in sync with the window scroll
/// position. Runs once immediately so a reload mid-page starts correct.
pub fn wire_scroll_state(window: &Window, nav: &Element, config: &NavConfig) -> Result<(), PageError> {
    let update = {
        let window = window.clone();
        let nav = nav.clone();
        let class = config.scrolled_class.clone();
        let threshold = config.scroll_threshold_px;
        move || {
            let scroll_y = window.scroll_y().unwrap_or(0.0);
            if is_scrolled(scroll_y, threshold) {
                nav.add_class(&class);
            } else {
                nav.remove_class(&class);
            }
        }
    };
    update();

    let scroll_callback = Closure::<dyn FnMut()>::new(update);
    let options = AddEventListenerOptions::new();
    options.set_passive(true);
    window.add_event_listener_with_callback_and_add_event_listener_options(
        "scroll",
        scroll_callback.as_ref().unchecked_ref(),
        &options,
    )?;
    scroll_callback.forget();
    Ok(())
}

/// Open/closed state of the mobile panel, mirrored onto the panel and its
/// toggle button. Class changes go through `Surface`, which logs failures.
pub struct MobileMenu<S> {
    toggle: S,
    menu: S,
    open_class: String,
    active_class: String,
    open: Cell<bool>,
}

impl<S: Surface> MobileMenu<S> {
    pub fn new(toggle: S, menu: S, config: &NavConfig) -> Self {
        Self {
            toggle,
            menu,
            open_class: config.open_class.clone(),
            active_class: config.active_class.clone(),
            open: Cell::new(false),
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn toggle(&self) {
        self.set_open(!self.open.get());
    }

    pub fn close(&self) {
        self.set_open(false);
    }

    fn set_open(&self, open: bool) {
        self.open.set(open);
        if open {
            self.menu.add_class(&self.open_class);
            self.toggle.add_class(&self.active_class);
        } else {
            self.menu.remove_class(&self.open_class);
            self.toggle.remove_class(&self.active_class);
        }
    }
}

/// Burger button opens and closes the mobile panel; following any link in
/// the panel closes it.
pub fn wire_mobile_menu(toggle: &Element, menu: &Element, config: &NavConfig) -> Result<(), PageError> {
    let state = Rc::new(MobileMenu::new(toggle.clone(), menu.clone(), config));

    let on_toggle = {
        let state = Rc::clone(&state);
        Closure::<dyn FnMut()>::new(move || state.toggle())
    };
    toggle.add_event_listener_with_callback("click", on_toggle.as_ref().unchecked_ref())?;
    on_toggle.forget();

    let on_link = {
        let state = Rc::clone(&state);
        Closure::<dyn FnMut()>::new(move || state.close())
    };
    for link in query_all_within(menu, "a") {
        link.add_event_listener_with_callback("click", on_link.as_ref().unchecked_ref())?;
    }
    on_link.forget();
    Ok(())
}
