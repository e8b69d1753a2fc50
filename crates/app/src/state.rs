use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use treetrend_core::player::ScenePlayer;
use treetrend_core::scene::{IndexChanged, Surface};
use treetrend_core::{Controller, Frame, ItemKey, LoadMsg, Loader, RenderConfig};

pub struct AppState {
    pub source: Option<PathBuf>,
    pub cancel: Arc<AtomicBool>,
    pub load_rx: Option<Receiver<LoadMsg>>,
    pub progress_parsed: usize,
    pub progress_total: usize,
    pub issues: Vec<String>,
    pub status: Option<String>,
    pub controller: Controller,
    pub index_rx: Receiver<IndexChanged>,
    pub timeline: ScenePlayer,
    pub treemap: ScenePlayer,
    /// Leaf whose sparkline marker is under the pointer; its label is shown
    /// even when it is outside the labelled set.
    pub hovered: Option<ItemKey>,
    clock: Instant,
}

impl AppState {
    pub fn new(config: RenderConfig) -> Self {
        let (controller, index_rx) = Controller::new(config);
        Self {
            source: None,
            cancel: Arc::new(AtomicBool::new(false)),
            load_rx: None,
            progress_parsed: 0,
            progress_total: 0,
            issues: Vec::new(),
            status: None,
            controller,
            index_rx,
            timeline: ScenePlayer::new(),
            treemap: ScenePlayer::new(),
            hovered: None,
            clock: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    pub fn start_load(&mut self, source: PathBuf) {
        self.source = Some(source.clone());
        self.progress_parsed = 0;
        self.progress_total = 0;
        self.issues.clear();
        self.status = None;
        self.cancel.store(false, Ordering::Relaxed);

        let (tx, rx): (Sender<LoadMsg>, Receiver<LoadMsg>) = unbounded();
        self.load_rx = Some(rx);
        let cancel = self.cancel.clone();
        let size_scale = self.controller.config().size_scale;

        std::thread::spawn(move || {
            let loader = Loader::new(cancel, size_scale);
            loader.load(source, tx);
        });
    }

    pub fn cancel_load(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_animating(&self) -> bool {
        let now = self.now_ms();
        self.timeline.is_animating(now) || self.treemap.is_animating(now)
    }

    pub fn player(&self, surface: Surface) -> &ScenePlayer {
        match surface {
            Surface::Timeline => &self.timeline,
            Surface::Treemap => &self.treemap,
        }
    }

    /// Hand a reconciled frame to both players.
    pub fn show(&mut self, frame: Frame) {
        let now = self.now_ms();
        self.timeline.apply(&frame.timeline, frame.transition, frame.reset, now);
        self.treemap.apply(&frame.treemap, frame.transition, frame.reset, now);
        tracing::debug!(index = ?frame.index, label = ?frame.label, "showing frame");
    }

    /// Apply the latest pending index change, if any.
    pub fn pump_selection(&mut self) -> bool {
        match self.controller.drain(&self.index_rx) {
            Some(frame) => {
                self.show(frame);
                true
            }
            None => false,
        }
    }
}
