//! Identity-keyed diffing of a new scene against the previously drawn one.
//!
//! The registry stores the *target* state of every element drawn so far.
//! Diffing only reads it; committing a frame is the single write.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scene::{hit_test, Attrs, Element, ElementKey, IndexChanged, Lerp};

/// What happens to elements that are missing from a new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Keep them at their last geometry.
    #[default]
    Freeze,
    /// Fade them to their neutral state, then drop them.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Transition {
    pub duration_ms: u64,
}

impl Transition {
    pub const INSTANT: Transition = Transition { duration_ms: 0 };

    pub fn animated(duration_ms: u64) -> Self {
        Self { duration_ms }
    }

    pub fn is_instant(&self) -> bool {
        self.duration_ms == 0
    }

    /// Linear progress in `[0, 1]` after `elapsed_ms`.
    pub fn progress(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (elapsed_ms / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mutation {
    Enter { key: ElementKey, to: Attrs },
    Update { key: ElementKey, from: Attrs, to: Attrs },
    Exit { key: ElementKey, from: Attrs },
}

impl Mutation {
    pub fn key(&self) -> &ElementKey {
        match self {
            Mutation::Enter { key, .. } | Mutation::Update { key, .. } | Mutation::Exit { key, .. } => key,
        }
    }

    /// State at `progress` through the transition.
    pub fn sample(&self, progress: f64) -> Attrs {
        match self {
            Mutation::Enter { to, .. } => to.neutral().lerp(to, progress),
            Mutation::Update { from, to, .. } => from.lerp(to, progress),
            Mutation::Exit { from, .. } => from.lerp(&from.neutral(), progress),
        }
    }

    /// Final state, `None` once an exit has completed.
    pub fn target(&self) -> Option<&Attrs> {
        match self {
            Mutation::Enter { to, .. } | Mutation::Update { to, .. } => Some(to),
            Mutation::Exit { .. } => None,
        }
    }
}

/// Previously drawn elements, in first-drawn order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    order: Vec<ElementKey>,
    elements: HashMap<ElementKey, Element>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.order.iter().filter_map(|k| self.elements.get(k))
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<IndexChanged> {
        hit_test(self.iter(), x, y)
    }

    /// Record `next` as drawn and drop whatever exited.
    pub fn commit(&mut self, next: Vec<Element>, mutations: &[Mutation]) {
        for element in next {
            if !self.elements.contains_key(&element.key) {
                self.order.push(element.key.clone());
            }
            self.elements.insert(element.key.clone(), element);
        }
        let exited: Vec<&ElementKey> = mutations
            .iter()
            .filter(|m| matches!(m, Mutation::Exit { .. }))
            .map(Mutation::key)
            .collect();
        if !exited.is_empty() {
            for key in &exited {
                self.elements.remove(*key);
            }
            self.order.retain(|k| self.elements.contains_key(k));
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.elements.clear();
    }
}

/// Classify every element of `next` against `previous`.
///
/// Unchanged elements produce nothing, so diffing the same frame twice is a
/// no-op the second time. Mutations follow `next`'s order; exits come last.
pub fn diff(previous: &Registry, next: &[Element], policy: ExitPolicy) -> Vec<Mutation> {
    let mut mutations = Vec::new();
    for element in next {
        match previous.get(&element.key) {
            None => mutations.push(Mutation::Enter {
                key: element.key.clone(),
                to: element.attrs.clone(),
            }),
            Some(old) if old.attrs != element.attrs => mutations.push(Mutation::Update {
                key: element.key.clone(),
                from: old.attrs.clone(),
                to: element.attrs.clone(),
            }),
            Some(_) => {}
        }
    }
    if policy == ExitPolicy::Remove {
        let present: std::collections::HashSet<&ElementKey> = next.iter().map(|e| &e.key).collect();
        for old in previous.iter().filter(|e| !present.contains(&e.key)) {
            mutations.push(Mutation::Exit {
                key: old.key.clone(),
                from: old.attrs.clone(),
            });
        }
    }
    mutations
}

/// Diff then commit in one step.
pub fn reconcile(registry: &mut Registry, next: Vec<Element>, policy: ExitPolicy) -> Vec<Mutation> {
    let mutations = diff(registry, &next, policy);
    registry.commit(next, &mutations);
    mutations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::scene::{CircleAttrs, RectAttrs};

    fn tile(name: &str, x: f64) -> Element {
        Element::new(
            ElementKey::CategoryTile(name.to_string()),
            Attrs::Rect(RectAttrs {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                fill: None,
                stroke: Color::WHITE,
                stroke_width: 1.0,
                opacity: 1.0,
            }),
        )
    }

    fn counts(mutations: &[Mutation]) -> (usize, usize, usize) {
        mutations.iter().fold((0, 0, 0), |(e, u, x), m| match m {
            Mutation::Enter { .. } => (e + 1, u, x),
            Mutation::Update { .. } => (e, u + 1, x),
            Mutation::Exit { .. } => (e, u, x + 1),
        })
    }

    #[test]
    fn first_frame_enters_everything() {
        let mut reg = Registry::new();
        let m = reconcile(&mut reg, vec![tile("a", 0.0), tile("b", 10.0)], ExitPolicy::Freeze);
        assert_eq!(counts(&m), (2, 0, 0));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn same_frame_twice_is_a_noop() {
        let mut reg = Registry::new();
        let frame = vec![tile("a", 0.0), tile("b", 10.0)];
        reconcile(&mut reg, frame.clone(), ExitPolicy::Remove);
        let second = reconcile(&mut reg, frame, ExitPolicy::Remove);
        assert!(second.is_empty());
    }

    #[test]
    fn reordering_only_updates_moved_geometry() {
        let mut reg = Registry::new();
        reconcile(&mut reg, vec![tile("a", 0.0), tile("b", 10.0)], ExitPolicy::Remove);
        let m = reconcile(&mut reg, vec![tile("b", 0.0), tile("a", 10.0)], ExitPolicy::Remove);
        assert_eq!(counts(&m), (0, 2, 0));
        let m = reconcile(&mut reg, vec![tile("a", 10.0), tile("b", 0.0)], ExitPolicy::Remove);
        assert!(m.is_empty());
    }

    #[test]
    fn freeze_keeps_missing_elements() {
        let mut reg = Registry::new();
        reconcile(&mut reg, vec![tile("a", 0.0), tile("b", 10.0)], ExitPolicy::Freeze);
        let m = reconcile(&mut reg, vec![tile("a", 5.0)], ExitPolicy::Freeze);
        assert_eq!(counts(&m), (0, 1, 0));
        let frozen = reg.get(&ElementKey::CategoryTile("b".into())).unwrap();
        assert_eq!(frozen, &tile("b", 10.0));
    }

    #[test]
    fn remove_emits_exit_and_drops() {
        let mut reg = Registry::new();
        reconcile(&mut reg, vec![tile("a", 0.0), tile("b", 10.0)], ExitPolicy::Remove);
        let m = reconcile(&mut reg, vec![tile("a", 0.0)], ExitPolicy::Remove);
        assert_eq!(counts(&m), (0, 0, 1));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.iter().count(), 1);
        assert!(m[0].target().is_none());
    }

    #[test]
    fn enter_grows_from_neutral() {
        let m = Mutation::Enter {
            key: ElementKey::TimelineNode(0),
            to: Attrs::Circle(CircleAttrs {
                cx: 5.0,
                cy: 5.0,
                r: 4.0,
                fill: Some(Color::ORANGE),
                stroke: Color::BLACK,
                stroke_width: 1.0,
                opacity: 1.0,
            }),
        };
        match m.sample(0.0) {
            Attrs::Circle(c) => assert_eq!((c.r, c.opacity), (0.0, 0.0)),
            other => panic!("unexpected {other:?}"),
        }
        match m.sample(0.5) {
            Attrs::Circle(c) => assert_eq!((c.r, c.opacity), (2.0, 0.5)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(Some(&m.sample(1.0)), m.target());
    }

    #[test]
    fn transition_progress() {
        assert_eq!(Transition::INSTANT.progress(0.0), 1.0);
        let t = Transition::animated(500);
        assert_eq!(t.progress(0.0), 0.0);
        assert_eq!(t.progress(250.0), 0.5);
        assert_eq!(t.progress(900.0), 1.0);
    }
}
