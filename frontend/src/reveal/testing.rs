//! In-memory stand-ins for the browser: a virtual clock, class-list
//! elements that journal their changes, and a hand-driven viewport monitor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::ObserverOptions;
use crate::error::PageError;
use crate::reveal::scheduler::{Monitor, Surface, Task, Timers};

struct Scheduled {
    due: u32,
    seq: usize,
    task: Task,
    on_fire: Box<dyn FnOnce(Task)>,
}

pub struct ManualClock {
    now: Cell<u32>,
    queue: RefCell<Vec<Scheduled>>,
    submitted: Cell<usize>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(0),
            queue: RefCell::new(Vec::new()),
            submitted: Cell::new(0),
        })
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    /// Total number of tasks ever submitted.
    pub fn submitted(&self) -> usize {
        self.submitted.get()
    }

    /// Runs every task due at or before `time`, earliest first, ties in
    /// submission order.
    pub fn advance_to(&self, time: u32) {
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let index = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, scheduled)| scheduled.due <= time)
                    .min_by_key(|(_, scheduled)| (scheduled.due, scheduled.seq))
                    .map(|(index, _)| index);
                index.map(|index| queue.remove(index))
            };
            match next {
                Some(scheduled) => {
                    self.now.set(scheduled.due.max(self.now.get()));
                    (scheduled.on_fire)(scheduled.task);
                }
                None => break,
            }
        }
        self.now.set(time.max(self.now.get()));
    }
}

impl Timers for Rc<ManualClock> {
    fn submit(&self, delay_ms: u32, task: Task, on_fire: Box<dyn FnOnce(Task)>) {
        let seq = self.submitted.get();
        self.submitted.set(seq + 1);
        self.queue.borrow_mut().push(Scheduled {
            due: self.now.get().saturating_add(delay_ms),
            seq,
            task,
            on_fire,
        });
    }
}

/// Every class added to any element, stamped with the virtual time.
pub struct Journal {
    clock: Rc<ManualClock>,
    entries: RefCell<Vec<(u32, &'static str, String)>>,
}

impl Journal {
    pub fn new(clock: Rc<ManualClock>) -> Rc<Self> {
        Rc::new(Self {
            clock,
            entries: RefCell::new(Vec::new()),
        })
    }

    fn record(&self, name: &'static str, class: &str) {
        self.entries
            .borrow_mut()
            .push((self.clock.now(), name, class.to_string()));
    }

    pub fn added(&self, class: &str) -> Vec<(u32, &'static str)> {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, _, added)| added == class)
            .map(|(time, name, _)| (*time, *name))
            .collect()
    }

    pub fn count(&self, name: &str, class: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, element, added)| *element == name && added == class)
            .count()
    }
}

#[derive(Clone)]
pub struct FakeElement {
    name: &'static str,
    classes: Rc<RefCell<Vec<String>>>,
    journal: Rc<Journal>,
}

impl FakeElement {
    pub fn new(name: &'static str, journal: &Rc<Journal>) -> Self {
        Self {
            name,
            classes: Rc::new(RefCell::new(Vec::new())),
            journal: Rc::clone(journal),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|existing| existing == class)
    }
}

impl Surface for FakeElement {
    fn add_class(&self, class: &str) {
        self.journal.record(self.name, class);
        if !self.has_class(class) {
            self.classes.borrow_mut().push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|existing| existing != class);
    }
}

struct Watch {
    targets: Vec<FakeElement>,
    entered: Vec<bool>,
    on_enter: Box<dyn FnMut(usize)>,
}

/// Viewport monitor driven by the test through `enter`.
pub struct FakeMonitor {
    available: bool,
    failing: bool,
    repeats: bool,
    watches: RefCell<Vec<Watch>>,
}

impl FakeMonitor {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            failing: false,
            repeats: false,
            watches: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(true)
        }
    }

    /// Keeps reporting targets after their first entry, like an observer
    /// that never unobserves.
    pub fn with_repeats(mut self) -> Self {
        self.repeats = true;
        self
    }

    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    pub fn targets(&self) -> Vec<&'static str> {
        self.watches
            .borrow()
            .iter()
            .flat_map(|watch| watch.targets.iter().map(FakeElement::name))
            .collect()
    }

    pub fn enter(&self, name: &str) {
        self.enter_where(|target| target.name() == name);
    }

    pub fn enter_all(&self) {
        self.enter_where(|_| true);
    }

    fn enter_where(&self, matches: impl Fn(&FakeElement) -> bool) {
        let repeats = self.repeats;
        for watch in self.watches.borrow_mut().iter_mut() {
            for index in 0..watch.targets.len() {
                if matches(&watch.targets[index]) && (repeats || !watch.entered[index]) {
                    watch.entered[index] = true;
                    (watch.on_enter)(index);
                }
            }
        }
    }
}

impl Monitor<FakeElement> for FakeMonitor {
    fn available(&self) -> bool {
        self.available
    }

    fn watch(
        &self,
        targets: Vec<FakeElement>,
        _options: &ObserverOptions,
        on_enter: Box<dyn FnMut(usize)>,
    ) -> Result<(), PageError> {
        if self.failing {
            return Err(PageError::Js("observer construction failed".to_string()));
        }
        let entered = vec![false; targets.len()];
        self.watches.borrow_mut().push(Watch {
            targets,
            entered,
            on_enter,
        });
        Ok(())
    }
}
