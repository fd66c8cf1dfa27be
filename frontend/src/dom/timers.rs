use gloo_timers::callback::Timeout;

use crate::reveal::scheduler::{Task, Timers};

/// `setTimeout`-backed timers. Handles are forgotten: reveal tasks are
/// idempotent, so nothing ever needs to cancel one.
pub struct BrowserTimers;

impl Timers for BrowserTimers {
    fn submit(&self, delay_ms: u32, task: Task, on_fire: Box<dyn FnOnce(Task)>) {
        Timeout::new(delay_ms, move || on_fire(task)).forget();
    }
}
