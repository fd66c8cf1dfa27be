use serde::Deserialize;

use crate::reveal::profile::{Profile, VISIBLE_CLASS};

/// Delay for the element at `order` in a group staggered by `stagger_ms`.
pub fn stagger_delay(order: u32, stagger_ms: u32) -> u32 {
    order.saturating_mul(stagger_ms)
}

/// Parts of the hub-and-spoke diagram, each driven by one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Lines,
    Hub,
    Cards,
    Badge,
    Container,
    Caption,
}

impl Role {
    /// Content roles start hidden and carry a profile; decorative roles only
    /// pick up their effect class when their phase fires.
    pub fn profile(self) -> Option<Profile> {
        match self {
            Role::Cards => Some(Profile::DiagramNode),
            Role::Caption => Some(Profile::FadeUp),
            _ => None,
        }
    }

    pub fn default_class(self) -> &'static str {
        match self {
            Role::Lines => "drawn",
            Role::Hub => "pulse",
            Role::Badge => "glow",
            Role::Container => "revealed",
            Role::Cards | Role::Caption => VISIBLE_CLASS,
        }
    }
}

/// One row of a multi-phase schedule: every element of `role` gets its
/// class at `offset_ms + order * stagger_ms` after the group trigger.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub role: Role,
    pub offset_ms: u32,
    #[serde(default)]
    pub stagger_ms: u32,
    #[serde(default)]
    pub class: Option<String>,
}

impl Phase {
    pub fn new(role: Role, offset_ms: u32, stagger_ms: u32) -> Self {
        Self {
            role,
            offset_ms,
            stagger_ms,
            class: None,
        }
    }

    pub fn delay_for(&self, order: u32) -> u32 {
        self.offset_ms.saturating_add(stagger_delay(order, self.stagger_ms))
    }

    pub fn shown_class(&self) -> &str {
        self.class.as_deref().unwrap_or_else(|| self.role.default_class())
    }
}

/// Fixed schedule table fired by a single group trigger.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    pub phases: Vec<Phase>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::diagram()
    }
}

impl Timeline {
    pub fn diagram() -> Self {
        Self {
            phases: vec![
                Phase::new(Role::Lines, 100, 0),
                Phase::new(Role::Hub, 300, 0),
                Phase::new(Role::Cards, 400, 120),
                Phase::new(Role::Badge, 800, 0),
                Phase::new(Role::Container, 900, 0),
                Phase::new(Role::Caption, 1200, 0),
            ],
        }
    }

    pub fn phase(&self, role: Role) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.role == role)
    }
}

/// Splits `items` into runs that share the same key, keeping first-seen
/// order both between and within runs. Used to restart stagger order for
/// each parent container.
pub fn sibling_runs<E, K, F>(items: Vec<E>, key: F) -> Vec<Vec<E>>
where
    K: PartialEq,
    F: Fn(&E) -> K,
{
    let mut runs: Vec<(K, Vec<E>)> = Vec::new();
    for item in items {
        let item_key = key(&item);
        match runs.iter_mut().find(|(run_key, _)| *run_key == item_key) {
            Some((_, run)) => run.push(item),
            None => runs.push((item_key, vec![item])),
        }
    }
    runs.into_iter().map(|(_, run)| run).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stagger_is_non_decreasing() {
        for stagger in [0, 1, 80, 100, 250] {
            let delays: Vec<u32> = (0..12).map(|order| stagger_delay(order, stagger)).collect();
            assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]), "stagger {stagger}: {delays:?}");
        }
    }

    #[test]
    fn stagger_saturates_instead_of_overflowing() {
        assert_eq!(stagger_delay(u32::MAX, 2), u32::MAX);
    }

    #[test]
    fn diagram_table_matches_fixed_offsets() {
        let timeline = Timeline::diagram();
        let first = |role| timeline.phase(role).unwrap().delay_for(0);
        assert_eq!(first(Role::Lines), 100);
        assert_eq!(first(Role::Hub), 300);
        assert_eq!(first(Role::Cards), 400);
        assert_eq!(first(Role::Badge), 800);
        assert_eq!(first(Role::Container), 900);
        assert_eq!(first(Role::Caption), 1200);
        assert_eq!(timeline.phase(Role::Cards).unwrap().delay_for(2), 640);
    }

    #[test]
    fn phase_class_falls_back_to_role_default() {
        let mut phase = Phase::new(Role::Badge, 0, 0);
        assert_eq!(phase.shown_class(), "glow");
        phase.class = Some("shine".to_string());
        assert_eq!(phase.shown_class(), "shine");
    }

    #[test]
    fn timeline_deserializes_from_plain_list() {
        let timeline: Timeline = serde_json::from_str(
            r#"[{"role": "cards", "offsetMs": 50, "staggerMs": 10}, {"role": "container", "offsetMs": 0, "class": "open"}]"#,
        )
        .unwrap();
        assert_eq!(timeline.phases.len(), 2);
        assert_eq!(timeline.phase(Role::Cards).unwrap().delay_for(3), 80);
        assert_eq!(timeline.phase(Role::Container).unwrap().shown_class(), "open");
        assert!(timeline.phase(Role::Hub).is_none());
    }

    #[test]
    fn only_content_roles_start_hidden() {
        assert_eq!(Role::Cards.profile(), Some(Profile::DiagramNode));
        assert_eq!(Role::Caption.profile(), Some(Profile::FadeUp));
        assert_eq!(Role::Lines.profile(), None);
        assert_eq!(Role::Container.profile(), None);
    }

    #[test]
    fn sibling_runs_group_by_parent_in_first_seen_order() {
        let cards = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let runs = sibling_runs(cards, |(parent, _)| *parent);
        let ids: Vec<Vec<i32>> = runs
            .iter()
            .map(|run| run.iter().map(|(_, id)| *id).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 3], vec![2, 5], vec![4]]);
    }

    #[test]
    fn sibling_runs_of_nothing_is_empty() {
        let runs = sibling_runs(Vec::<u8>::new(), |item| *item);
        assert!(runs.is_empty());
    }
}
