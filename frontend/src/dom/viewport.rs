use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::js_sys::{Array, Reflect};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, Window};

use crate::config::ObserverOptions;
use crate::error::PageError;
use crate::reveal::scheduler::Monitor;

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub fn prefers_reduced_motion(window: &Window) -> bool {
    window
        .match_media(REDUCED_MOTION_QUERY)
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// `IntersectionObserver`-backed monitor, one observer per watched group.
pub struct IntersectionMonitor {
    window: Window,
}

impl IntersectionMonitor {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Monitor<Element> for IntersectionMonitor {
    fn available(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    }

    fn watch(
        &self,
        targets: Vec<Element>,
        options: &ObserverOptions,
        mut on_enter: Box<dyn FnMut(usize)>,
    ) -> Result<(), PageError> {
        let watched = targets.clone();
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    if let Some(index) = watched.iter().position(|element| *element == target) {
                        on_enter(index);
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        for target in &targets {
            observer.observe(target);
        }

        // The observer lives as long as the page.
        callback.forget();
        Ok(())
    }
}
