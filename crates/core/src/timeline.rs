//! The scrubber strip and the controller that owns the current index.
//!
//! Every view reports clicks as [`IndexChanged`] on one channel. The host
//! drains it and calls [`Controller::select`], which is the only way the
//! selection moves after the initial load.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::color::Color;
use crate::config::RenderConfig;
use crate::frame;
use crate::label::date_label;
use crate::model::{LayoutNode, TimePoint};
use crate::reconcile::{reconcile, Mutation, Registry, Transition};
use crate::scale::index_to_x;
use crate::scene::{
    Attrs, CircleAttrs, Element, ElementKey, IndexChanged, LineAttrs, Surface, TextAttrs,
};
use crate::sparkline::SeriesTable;

/// One node per time point. Even nodes carry a date label and are
/// clickable; odd nodes only keep the spacing. The current node is
/// outlined in red.
pub fn timeline_elements(time_points: &[TimePoint], current: usize, cfg: &RenderConfig) -> Vec<Element> {
    let n = time_points.len();
    if n == 0 {
        return Vec::new();
    }
    let x = |i: usize| index_to_x(i as f64, n as f64, cfg.timeline_margin, cfg.width - cfg.timeline_margin);
    let cy = cfg.timeline_height / 2.0;

    let mut out = Vec::with_capacity(2 * n + 1);
    out.push(Element::new(
        ElementKey::TimelineAxis,
        Attrs::Line(LineAttrs {
            x1: x(0),
            y1: cy,
            x2: x(n - 1),
            y2: cy,
            stroke: Color::WHITE,
            stroke_width: 2.0,
            opacity: 1.0,
        }),
    ));
    for (i, tp) in time_points.iter().enumerate() {
        let labelled = i % 2 == 0;
        let is_current = i == current;
        let node = Element::new(
            ElementKey::TimelineNode(i),
            Attrs::Circle(CircleAttrs {
                cx: x(i),
                cy,
                r: cfg.timeline_node_radius,
                fill: labelled.then_some(Color::WHITE),
                stroke: if is_current { Color::RED } else { Color::WHITE },
                stroke_width: match (is_current, labelled) {
                    (true, _) => 2.0,
                    (false, true) => 1.0,
                    (false, false) => 0.0,
                },
                opacity: 1.0,
            }),
        );
        out.push(if labelled { node.clickable(i) } else { node });
        out.push(Element::new(
            ElementKey::TimelineLabel(i),
            Attrs::Text(TextAttrs {
                x: x(i),
                y: cy - cfg.timeline_node_radius * 2.0,
                text: date_label(&tp.label),
                font_size: cfg.timeline_font_size,
                fill: Color::WHITE,
                bold: false,
                opacity: if labelled { 1.0 } else { 0.0 },
                visible: labelled,
            }),
        ));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub current_index: usize,
}

/// The outcome of one render pass for one surface: the changes to apply
/// and the full retained scene after applying them.
#[derive(Debug, Clone, Default)]
pub struct SurfaceFrame {
    pub mutations: Vec<Mutation>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub index: Option<usize>,
    pub label: Option<String>,
    pub transition: Transition,
    /// The dataset was replaced; renderers should drop what they hold.
    pub reset: bool,
    pub timeline: SurfaceFrame,
    pub treemap: SurfaceFrame,
}

impl Frame {
    pub fn surface(&self, surface: Surface) -> &SurfaceFrame {
        match surface {
            Surface::Timeline => &self.timeline,
            Surface::Treemap => &self.treemap,
        }
    }
}

pub struct Controller {
    config: RenderConfig,
    time_points: Vec<TimePoint>,
    series: SeriesTable,
    selection: Option<SelectionState>,
    timeline: Registry,
    treemap: Registry,
    layout: Vec<LayoutNode>,
    painted: bool,
    events: Sender<IndexChanged>,
}

impl Controller {
    /// The receiver is the host's end of the index-change callback.
    pub fn new(config: RenderConfig) -> (Self, Receiver<IndexChanged>) {
        let (tx, rx) = unbounded();
        let controller = Self {
            config,
            time_points: Vec::new(),
            series: SeriesTable::default(),
            selection: None,
            timeline: Registry::new(),
            treemap: Registry::new(),
            layout: Vec::new(),
            painted: false,
            events: tx,
        };
        (controller, rx)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn time_points(&self) -> &[TimePoint] {
        &self.time_points
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection.map(|s| s.current_index)
    }

    /// Layout of the currently selected time point.
    pub fn layout(&self) -> &[LayoutNode] {
        &self.layout
    }

    pub fn scene(&self, surface: Surface) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.registry(surface).iter()
    }

    /// A handle views outside the core can emit selections through.
    pub fn sender(&self) -> Sender<IndexChanged> {
        self.events.clone()
    }

    /// Replace the dataset and select its last time point.
    pub fn load(&mut self, time_points: Vec<TimePoint>) -> Frame {
        info!(time_points = time_points.len(), "dataset loaded");
        self.series = SeriesTable::build(&time_points);
        self.selection = time_points.len().checked_sub(1).map(|i| SelectionState { current_index: i });
        self.time_points = time_points;
        self.timeline.clear();
        self.treemap.clear();
        self.painted = false;
        let mut frame = self.render();
        frame.reset = true;
        frame
    }

    /// Add a time point at the end. The selection only moves if there was
    /// none yet.
    pub fn append(&mut self, tp: TimePoint) -> Frame {
        self.series.push(&tp);
        self.time_points.push(tp);
        if self.selection.is_none() {
            self.selection = Some(SelectionState { current_index: 0 });
        }
        self.render()
    }

    /// Move the selection and recompute every view. Out-of-range requests
    /// are ignored.
    pub fn select(&mut self, index: usize) -> Option<Frame> {
        if index >= self.time_points.len() {
            warn!(index, len = self.time_points.len(), "ignoring out-of-range selection");
            return None;
        }
        self.selection = Some(SelectionState { current_index: index });
        Some(self.render())
    }

    /// Apply every pending selection; only the last one is rendered.
    pub fn drain(&mut self, rx: &Receiver<IndexChanged>) -> Option<Frame> {
        let last = rx.try_iter().last()?;
        self.select(last.0)
    }

    /// Hit-test the retained scene and report the clicked index upward.
    pub fn click(&self, surface: Surface, x: f64, y: f64) -> Option<IndexChanged> {
        let hit = self.registry(surface).hit_test(x, y)?;
        if self.events.send(hit).is_err() {
            warn!("index change receiver dropped");
        }
        Some(hit)
    }

    fn registry(&self, surface: Surface) -> &Registry {
        match surface {
            Surface::Timeline => &self.timeline,
            Surface::Treemap => &self.treemap,
        }
    }

    /// The first populated frame animates in; every later one is instant.
    fn next_transition(&mut self) -> Transition {
        if self.selection.is_some() && !self.painted {
            self.painted = true;
            Transition::animated(self.config.initial_transition_ms)
        } else {
            Transition::INSTANT
        }
    }

    fn render(&mut self) -> Frame {
        let transition = self.next_transition();
        let Some(index) = self.current_index() else {
            self.layout.clear();
            return Frame {
                transition,
                ..Frame::default()
            };
        };
        let scenes = frame::render(&self.time_points, &self.series, index, &self.config);
        let policy = self.config.exit_policy;
        let timeline = reconcile(&mut self.timeline, scenes.timeline, policy);
        let treemap = reconcile(&mut self.treemap, scenes.treemap, policy);
        self.layout = scenes.layout;
        debug!(
            index,
            duration_ms = transition.duration_ms,
            timeline = timeline.len(),
            treemap = treemap.len(),
            "frame reconciled"
        );
        Frame {
            index: Some(index),
            label: self.time_points.get(index).map(|tp| tp.label.clone()),
            transition,
            reset: false,
            timeline: SurfaceFrame {
                mutations: timeline,
                elements: self.timeline.iter().cloned().collect(),
            },
            treemap: SurfaceFrame {
                mutations: treemap,
                elements: self.treemap.iter().cloned().collect(),
            },
        }
    }
}
