use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::config::ObserverOptions;
use crate::error::PageError;
use crate::reveal::profile::{Profile, HIDDEN_CLASS, VISIBLE_CLASS};
use crate::reveal::state::RevealState;
use crate::reveal::timeline::{stagger_delay, Phase};

/// Something whose visual state is driven by class swaps.
pub trait Surface {
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
}

/// Deferred task submission. `on_fire` must be called at most once, with
/// the task it was submitted with, no earlier than `delay_ms` from now.
pub trait Timers {
    fn submit(&self, delay_ms: u32, task: Task, on_fire: Box<dyn FnOnce(Task)>);
}

/// Viewport monitoring.
pub trait Monitor<E> {
    fn available(&self) -> bool;

    /// Calls `on_enter(i)` the first time `targets[i]` qualifies and stops
    /// watching it afterwards.
    fn watch(
        &self,
        targets: Vec<E>,
        options: &ObserverOptions,
        on_enter: Box<dyn FnMut(usize)>,
    ) -> Result<(), PageError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RevealId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// Who a scheduled task completes on behalf of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Element(RevealId),
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub owner: Owner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Full,
    Reduced,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupSpec {
    pub name: String,
    pub profile: Profile,
    pub stagger_ms: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub pending: usize,
    pub observed: usize,
    pub revealed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fallback {
    Idle,
    Armed,
    Fired,
}

struct Revealable<E> {
    element: E,
    delay_ms: u32,
    profile: Option<Profile>,
    shown_class: String,
    state: RevealState,
}

enum Trigger<E> {
    EachMember,
    Whole(E),
}

struct Group<E> {
    name: String,
    trigger: Trigger<E>,
    members: Vec<RevealId>,
}

struct Registry<E> {
    items: Vec<Revealable<E>>,
    groups: Vec<Group<E>>,
}

struct Inner<E, T> {
    timers: T,
    motion: Motion,
    registry: RefCell<Registry<E>>,
    fallback: Cell<Fallback>,
}

/// Moves registered elements from hidden to revealed, either when they
/// scroll into view or when the fallback deadline passes. Cheap to clone;
/// clones share state.
pub struct RevealScheduler<E, T> {
    inner: Rc<Inner<E, T>>,
}

impl<E, T> Clone for RevealScheduler<E, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E, T> RevealScheduler<E, T>
where
    E: Surface + Clone + 'static,
    T: Timers + 'static,
{
    pub fn new(timers: T, motion: Motion) -> Self {
        Self {
            inner: Rc::new(Inner {
                timers,
                motion,
                registry: RefCell::new(Registry {
                    items: Vec::new(),
                    groups: Vec::new(),
                }),
                fallback: Cell::new(Fallback::Idle),
            }),
        }
    }

    /// Registers a group whose members are each observed on their own and
    /// revealed `order * stagger_ms` after entering. Hides the members right
    /// away. Returns `None` for an empty group.
    pub fn register(&self, spec: &GroupSpec, elements: Vec<E>) -> Option<GroupId> {
        if elements.is_empty() {
            debug!("No elements for reveal group '{}', skipping", spec.name);
            return None;
        }

        let members = elements
            .into_iter()
            .enumerate()
            .map(|(order, element)| Revealable {
                element,
                delay_ms: stagger_delay(order as u32, spec.stagger_ms),
                profile: Some(spec.profile),
                shown_class: VISIBLE_CLASS.to_string(),
                state: RevealState::Pending,
            })
            .collect();

        Some(self.insert_group(&spec.name, Trigger::EachMember, members))
    }

    /// Registers a multi-phase group: one `trigger` element starts every
    /// phase at once, each phase running on its own fixed offset.
    pub fn register_timeline(
        &self,
        name: &str,
        trigger: E,
        tracks: Vec<(&Phase, Vec<E>)>,
    ) -> Option<GroupId> {
        let members: Vec<Revealable<E>> = tracks
            .into_iter()
            .flat_map(|(phase, elements)| {
                let phase = phase.clone();
                elements
                    .into_iter()
                    .enumerate()
                    .map(move |(order, element)| Revealable {
                        element,
                        delay_ms: phase.delay_for(order as u32),
                        profile: phase.role.profile(),
                        shown_class: phase.shown_class().to_string(),
                        state: RevealState::Pending,
                    })
            })
            .collect();

        if members.is_empty() {
            debug!("No elements for reveal timeline '{}', skipping", name);
            return None;
        }

        Some(self.insert_group(name, Trigger::Whole(trigger), members))
    }

    fn insert_group(&self, name: &str, trigger: Trigger<E>, members: Vec<Revealable<E>>) -> GroupId {
        let mut registry = self.inner.registry.borrow_mut();
        let mut ids = Vec::with_capacity(members.len());

        for member in members {
            if let Some(profile) = member.profile {
                member.element.add_class(HIDDEN_CLASS);
                member.element.add_class(profile.class());
            }
            ids.push(RevealId(registry.items.len()));
            registry.items.push(member);
        }

        debug!("Registered reveal group '{}' with {} elements", name, ids.len());
        let id = GroupId(registry.groups.len());
        registry.groups.push(Group {
            name: name.to_string(),
            trigger,
            members: ids,
        });
        id
    }

    /// Starts watching a group. Without a monitor, or when reduced motion is
    /// requested, every member is revealed on the spot.
    pub fn observe<M: Monitor<E>>(&self, group: GroupId, monitor: &M, options: &ObserverOptions) {
        let (name, targets, members, whole) = {
            let registry = self.inner.registry.borrow();
            let Some(entry) = registry.groups.get(group.0) else {
                return;
            };
            match &entry.trigger {
                Trigger::EachMember => (
                    entry.name.clone(),
                    entry
                        .members
                        .iter()
                        .map(|id| registry.items[id.0].element.clone())
                        .collect::<Vec<_>>(),
                    entry.members.clone(),
                    false,
                ),
                Trigger::Whole(element) => (
                    entry.name.clone(),
                    vec![element.clone()],
                    entry.members.clone(),
                    true,
                ),
            }
        };

        if self.inner.motion == Motion::Reduced {
            debug!("Reduced motion requested, revealing '{}' immediately", name);
            self.reveal_now(&members);
            return;
        }
        if !monitor.available() {
            debug!("No viewport monitoring, revealing '{}' immediately", name);
            self.reveal_now(&members);
            return;
        }

        let scheduler = self.clone();
        let ids = members.clone();
        let on_enter: Box<dyn FnMut(usize)> = if whole {
            Box::new(move |_: usize| scheduler.trigger(&ids))
        } else {
            Box::new(move |index: usize| {
                if let Some(id) = ids.get(index) {
                    scheduler.trigger(std::slice::from_ref(id));
                }
            })
        };

        if let Err(err) = monitor.watch(targets, options, on_enter) {
            warn!("Could not observe reveal group '{}': {}", name, err);
            self.reveal_now(&members);
        }
    }

    /// Marks members observed and schedules their reveals. Members already
    /// past `pending` are ignored so each fires at most once.
    fn trigger(&self, ids: &[RevealId]) {
        let due: Vec<(RevealId, u32)> = {
            let mut registry = self.inner.registry.borrow_mut();
            ids.iter()
                .filter_map(|id| {
                    let item = registry.items.get_mut(id.0)?;
                    item.state
                        .advance(RevealState::Observed)
                        .then_some((*id, item.delay_ms))
                })
                .collect()
        };

        for (id, delay_ms) in due {
            self.submit(delay_ms, Owner::Element(id));
        }
    }

    fn submit(&self, delay_ms: u32, owner: Owner) {
        let scheduler = self.clone();
        self.inner.timers.submit(
            delay_ms,
            Task { owner },
            Box::new(move |task| scheduler.complete(task)),
        );
    }

    /// Completion handler for every submitted task.
    pub fn complete(&self, task: Task) {
        match task.owner {
            Owner::Element(id) => {
                self.reveal(id);
            }
            Owner::Fallback => self.fire_fallback(),
        }
    }

    fn reveal(&self, id: RevealId) -> bool {
        let mut registry = self.inner.registry.borrow_mut();
        let Some(item) = registry.items.get_mut(id.0) else {
            return false;
        };
        if !item.state.advance(RevealState::Revealed) {
            return false;
        }
        if item.profile.is_some() {
            item.element.remove_class(HIDDEN_CLASS);
        }
        item.element.add_class(&item.shown_class);
        true
    }

    fn reveal_now(&self, ids: &[RevealId]) {
        for id in ids {
            self.reveal(*id);
        }
    }

    /// Reveals everything not yet revealed. Timers still in flight stay
    /// scheduled and do nothing when they fire. Returns how many changed.
    pub fn force_reveal_all(&self) -> usize {
        let count = self.inner.registry.borrow().items.len();
        (0..count).filter(|&index| self.reveal(RevealId(index))).count()
    }

    /// Arms the one-shot safety deadline. Later calls are ignored.
    pub fn arm_fallback(&self, deadline_ms: u32) {
        if self.inner.fallback.get() != Fallback::Idle {
            return;
        }
        self.inner.fallback.set(Fallback::Armed);
        self.submit(deadline_ms, Owner::Fallback);
    }

    fn fire_fallback(&self) {
        if self.inner.fallback.get() != Fallback::Armed {
            return;
        }
        self.inner.fallback.set(Fallback::Fired);

        let forced = self.force_reveal_all();
        let total = self.inner.registry.borrow().items.len();
        if forced > 0 {
            info!("Reveal fallback forced {} of {} elements", forced, total);
        } else {
            debug!("Reveal fallback fired with all {} elements already revealed", total);
        }
    }

    #[cfg(test)]
    pub fn state(&self, id: RevealId) -> Option<RevealState> {
        self.inner.registry.borrow().items.get(id.0).map(|item| item.state)
    }

    #[cfg(test)]
    pub fn members(&self, group: GroupId) -> Vec<RevealId> {
        self.inner
            .registry
            .borrow()
            .groups
            .get(group.0)
            .map(|group| group.members.clone())
            .unwrap_or_default()
    }

    pub fn tally(&self) -> Tally {
        let registry = self.inner.registry.borrow();
        registry.items.iter().fold(Tally::default(), |mut tally, item| {
            match item.state {
                RevealState::Pending => tally.pending += 1,
                RevealState::Observed => tally.observed += 1,
                RevealState::Revealed => tally.revealed += 1,
            }
            tally
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::testing::{FakeElement, FakeMonitor, Journal, ManualClock};
    use crate::reveal::timeline::{Role, Timeline};

    type Scheduler = RevealScheduler<FakeElement, Rc<ManualClock>>;

    fn setup(motion: Motion) -> (Scheduler, Rc<ManualClock>, Rc<Journal>) {
        let clock = ManualClock::new();
        let journal = Journal::new(Rc::clone(&clock));
        (RevealScheduler::new(Rc::clone(&clock), motion), clock, journal)
    }

    fn cards(journal: &Rc<Journal>, names: &[&'static str]) -> Vec<FakeElement> {
        names.iter().map(|name| FakeElement::new(name, journal)).collect()
    }

    fn spec(stagger_ms: u32) -> GroupSpec {
        GroupSpec {
            name: "blog cards".to_string(),
            profile: Profile::FadeUp,
            stagger_ms,
        }
    }

    fn options() -> ObserverOptions {
        ObserverOptions::default()
    }

    #[test]
    fn register_hides_members_and_leaves_them_pending() {
        let (scheduler, _clock, journal) = setup(Motion::Full);
        let elements = cards(&journal, &["a", "b"]);
        let group = scheduler.register(&spec(100), elements.clone()).unwrap();

        for element in &elements {
            assert!(element.has_class(HIDDEN_CLASS));
            assert!(element.has_class("anim-fade-up"));
            assert!(!element.has_class(VISIBLE_CLASS));
        }
        for id in scheduler.members(group) {
            assert_eq!(scheduler.state(id), Some(RevealState::Pending));
        }
    }

    #[test]
    fn empty_group_is_not_registered() {
        let (scheduler, _clock, journal) = setup(Motion::Full);
        assert!(scheduler.register(&spec(100), Vec::new()).is_none());
        assert!(scheduler
            .register_timeline("diagram", FakeElement::new("root", &journal), Vec::new())
            .is_none());
        assert_eq!(scheduler.tally(), Tally::default());
    }

    #[test]
    fn observing_an_unknown_group_does_nothing() {
        let (scheduler, _clock, _journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        scheduler.observe(GroupId(7), &monitor, &options());
        assert_eq!(monitor.watch_count(), 0);
    }

    #[test]
    fn simultaneous_entry_reveals_on_stagger() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b", "c"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter_all();
        clock.advance_to(1_000);

        assert_eq!(journal.added(VISIBLE_CLASS), vec![(0, "a"), (100, "b"), (200, "c")]);
        assert_eq!(scheduler.tally().revealed, 3);
    }

    #[test]
    fn entered_member_is_observed_until_its_delay_passes() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("b");
        let ids = scheduler.members(group);
        assert_eq!(scheduler.state(ids[0]), Some(RevealState::Pending));
        assert_eq!(scheduler.state(ids[1]), Some(RevealState::Observed));

        clock.advance_to(99);
        assert_eq!(scheduler.state(ids[1]), Some(RevealState::Observed));
        clock.advance_to(100);
        assert_eq!(scheduler.state(ids[1]), Some(RevealState::Revealed));
    }

    #[test]
    fn delay_counts_from_each_members_own_entry() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b", "c"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("c");
        clock.advance_to(500);
        monitor.enter("a");
        clock.advance_to(600);
        monitor.enter("b");
        clock.advance_to(1_000);

        assert_eq!(journal.added(VISIBLE_CLASS), vec![(200, "c"), (500, "a"), (700, "b")]);
    }

    #[test]
    fn repeated_entry_fires_once() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true).with_repeats();
        let group = scheduler.register(&spec(0), cards(&journal, &["a"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("a");
        monitor.enter("a");
        clock.advance_to(10);
        monitor.enter("a");
        clock.advance_to(20);

        assert_eq!(clock.submitted(), 1);
        assert_eq!(journal.added(VISIBLE_CLASS), vec![(0, "a")]);
    }

    #[test]
    fn reveal_swaps_hidden_for_visible() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let elements = cards(&journal, &["a"]);
        let group = scheduler.register(&spec(0), elements.clone()).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("a");
        clock.advance_to(0);

        assert!(!elements[0].has_class(HIDDEN_CLASS));
        assert!(elements[0].has_class(VISIBLE_CLASS));
        assert!(elements[0].has_class("anim-fade-up"));
    }

    #[test]
    fn diagram_phases_follow_the_fixed_table() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let timeline = Timeline::diagram();
        let root = FakeElement::new("root", &journal);

        let track = |role, names: &[&'static str]| (timeline.phase(role).unwrap(), cards(&journal, names));
        let group = scheduler
            .register_timeline(
                "diagram",
                root.clone(),
                vec![
                    track(Role::Lines, &["line-1", "line-2"]),
                    track(Role::Hub, &["hub"]),
                    track(Role::Cards, &["card-1", "card-2", "card-3"]),
                    track(Role::Badge, &["badge"]),
                    (timeline.phase(Role::Container).unwrap(), vec![root.clone()]),
                    track(Role::Caption, &["caption"]),
                ],
            )
            .unwrap();
        scheduler.observe(group, &monitor, &options());
        assert_eq!(monitor.targets(), vec!["root"]);

        monitor.enter("root");
        clock.advance_to(2_000);

        assert_eq!(journal.added("drawn"), vec![(100, "line-1"), (100, "line-2")]);
        assert_eq!(journal.added("pulse"), vec![(300, "hub")]);
        assert_eq!(
            journal.added(VISIBLE_CLASS),
            vec![(400, "card-1"), (520, "card-2"), (640, "card-3"), (1_200, "caption")]
        );
        assert_eq!(journal.added("glow"), vec![(800, "badge")]);
        assert_eq!(journal.added("revealed"), vec![(900, "root")]);
        assert!(!root.has_class(HIDDEN_CLASS));
    }

    #[test]
    fn diagram_without_optional_parts_still_runs() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let timeline = Timeline::diagram();
        let group = scheduler
            .register_timeline(
                "diagram",
                FakeElement::new("root", &journal),
                vec![
                    (timeline.phase(Role::Badge).unwrap(), Vec::new()),
                    (timeline.phase(Role::Cards).unwrap(), cards(&journal, &["card-1"])),
                ],
            )
            .unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("root");
        clock.advance_to(2_000);

        assert_eq!(journal.added(VISIBLE_CLASS), vec![(400, "card-1")]);
        assert!(journal.added("glow").is_empty());
    }

    #[test]
    fn fallback_reveals_everything_at_the_deadline() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b", "c"])).unwrap();
        scheduler.arm_fallback(3_500);
        scheduler.observe(group, &monitor, &options());

        clock.advance_to(3_499);
        assert_eq!(scheduler.tally().pending, 3);

        clock.advance_to(3_500);
        assert_eq!(journal.added(VISIBLE_CLASS), vec![(3_500, "a"), (3_500, "b"), (3_500, "c")]);
        assert_eq!(scheduler.tally().revealed, 3);
    }

    #[test]
    fn fallback_only_touches_unrevealed_elements() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b", "c"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        monitor.enter("a");
        clock.advance_to(50);
        assert_eq!(scheduler.force_reveal_all(), 2);
        assert_eq!(scheduler.force_reveal_all(), 0);

        assert_eq!(journal.added(VISIBLE_CLASS), vec![(0, "a"), (50, "b"), (50, "c")]);
    }

    #[test]
    fn timers_landing_after_the_fallback_are_no_ops() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b", "c"])).unwrap();
        scheduler.arm_fallback(3_500);
        scheduler.observe(group, &monitor, &options());

        clock.advance_to(3_450);
        monitor.enter_all();
        clock.advance_to(5_000);

        assert_eq!(
            journal.added(VISIBLE_CLASS),
            vec![(3_450, "a"), (3_500, "b"), (3_500, "c")]
        );
        for name in ["a", "b", "c"] {
            assert_eq!(journal.count(name, VISIBLE_CLASS), 1);
        }
    }

    #[test]
    fn fallback_arms_only_once() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        scheduler.register(&spec(0), cards(&journal, &["a"])).unwrap();
        scheduler.arm_fallback(1_500);
        scheduler.arm_fallback(3_500);

        assert_eq!(clock.submitted(), 1);
        clock.advance_to(1_500);
        assert_eq!(journal.added(VISIBLE_CLASS), vec![(1_500, "a")]);
    }

    #[test]
    fn reduced_motion_reveals_without_delay() {
        let (scheduler, clock, journal) = setup(Motion::Reduced);
        let monitor = FakeMonitor::new(true);
        let group = scheduler.register(&spec(100), cards(&journal, &["a", "b"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        assert_eq!(monitor.watch_count(), 0);
        assert_eq!(clock.submitted(), 0);
        assert_eq!(journal.added(VISIBLE_CLASS), vec![(0, "a"), (0, "b")]);
    }

    #[test]
    fn missing_monitor_reveals_without_delay() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(false);
        let timeline = Timeline::diagram();
        let group = scheduler
            .register_timeline(
                "diagram",
                FakeElement::new("root", &journal),
                vec![(timeline.phase(Role::Cards).unwrap(), cards(&journal, &["card-1", "card-2"]))],
            )
            .unwrap();
        scheduler.observe(group, &monitor, &options());

        assert_eq!(clock.submitted(), 0);
        assert_eq!(journal.added(VISIBLE_CLASS), vec![(0, "card-1"), (0, "card-2")]);
    }

    #[test]
    fn failed_watch_degrades_to_visible() {
        let (scheduler, _clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::failing();
        let group = scheduler.register(&spec(100), cards(&journal, &["a"])).unwrap();
        scheduler.observe(group, &monitor, &options());

        assert_eq!(scheduler.tally().revealed, 1);
    }

    #[test]
    fn every_element_ends_revealed_exactly_once() {
        let (scheduler, clock, journal) = setup(Motion::Full);
        let monitor = FakeMonitor::new(true);
        let names = ["a", "b", "c", "d", "e"];
        let blog = scheduler.register(&spec(100), cards(&journal, &names[..3])).unwrap();
        let values = scheduler
            .register(
                &GroupSpec {
                    name: "value cards".to_string(),
                    profile: Profile::SlideRight,
                    stagger_ms: 250,
                },
                cards(&journal, &names[3..]),
            )
            .unwrap();
        scheduler.arm_fallback(3_500);
        scheduler.observe(blog, &monitor, &options());
        scheduler.observe(values, &monitor, &options());

        monitor.enter("b");
        clock.advance_to(200);
        monitor.enter("e");
        clock.advance_to(10_000);

        assert_eq!(scheduler.tally(), Tally { pending: 0, observed: 0, revealed: 5 });
        for name in names {
            assert_eq!(journal.count(name, VISIBLE_CLASS), 1, "{name}");
        }
    }
}
