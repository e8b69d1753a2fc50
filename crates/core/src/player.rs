//! Time-based playback of reconciled frames for renderers that animate.
//!
//! The player is driven by a caller-supplied clock in milliseconds, so the
//! same frame always samples to the same shapes.

use std::collections::HashMap;

use crate::reconcile::{Mutation, Transition};
use crate::scene::{Element, ElementKey};
use crate::timeline::SurfaceFrame;

#[derive(Debug, Default)]
pub struct ScenePlayer {
    elements: Vec<Element>,
    active: HashMap<ElementKey, Mutation>,
    exiting: Vec<(Element, Mutation)>,
    transition: Transition,
    started_ms: f64,
}

impl ScenePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `frame`. Anything still in flight is superseded: the
    /// new mutations start from the previous targets.
    pub fn apply(&mut self, frame: &SurfaceFrame, transition: Transition, reset: bool, now_ms: f64) {
        if reset {
            self.exiting.clear();
        }
        let previous: HashMap<&ElementKey, &Element> = self.elements.iter().map(|e| (&e.key, e)).collect();
        let mut exiting = Vec::new();
        let mut active = HashMap::new();
        for m in &frame.mutations {
            match m {
                Mutation::Exit { key, .. } => {
                    if let Some(old) = previous.get(key) {
                        exiting.push(((*old).clone(), m.clone()));
                    }
                }
                _ => {
                    active.insert(m.key().clone(), m.clone());
                }
            }
        }
        self.exiting = exiting;
        self.active = active;
        self.elements = frame.elements.clone();
        self.transition = transition;
        self.started_ms = now_ms;
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        self.transition.progress(now_ms - self.started_ms)
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        (!self.active.is_empty() || !self.exiting.is_empty()) && self.progress(now_ms) < 1.0
    }

    /// Shapes to draw at `now_ms`, in paint order. Exiting shapes are drawn
    /// last until their transition ends.
    pub fn sample(&self, now_ms: f64) -> Vec<Element> {
        let t = self.progress(now_ms);
        let mut out: Vec<Element> = self
            .elements
            .iter()
            .map(|e| match self.active.get(&e.key) {
                Some(m) if t < 1.0 => Element {
                    attrs: m.sample(t),
                    ..e.clone()
                },
                _ => e.clone(),
            })
            .collect();
        if t < 1.0 {
            out.extend(self.exiting.iter().map(|(e, m)| Element {
                attrs: m.sample(t),
                on_click: None,
                ..e.clone()
            }));
        }
        out
    }
}
