use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, NodeList};

use crate::reveal::scheduler::Surface;

impl Surface for Element {
    fn add_class(&self, class: &str) {
        if let Err(err) = self.class_list().add_1(class) {
            warn!("Could not add class '{}': {:?}", class, err);
        }
    }

    fn remove_class(&self, class: &str) {
        if let Err(err) = self.class_list().remove_1(class) {
            warn!("Could not remove class '{}': {:?}", class, err);
        }
    }
}

pub fn by_id(document: &Document, id: &str) -> Option<Element> {
    document.get_element_by_id(id)
}

pub fn query_one(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}

pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    match document.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(err) => {
            warn!("Bad selector '{}': {:?}", selector, err);
            Vec::new()
        }
    }
}

pub fn query_all_within(root: &Element, selector: &str) -> Vec<Element> {
    match root.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(err) => {
            warn!("Bad selector '{}': {:?}", selector, err);
            Vec::new()
        }
    }
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}
