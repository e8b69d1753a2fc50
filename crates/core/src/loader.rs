use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};

use crate::error::{LoadError, NormalizeError};
use crate::model::Dataset;
use crate::normalize::{normalize_time_point, parse};

#[derive(Debug, Clone)]
pub enum LoadMsg {
    Progress { parsed: usize, total: usize },
    Issue(NormalizeError),
    /// The whole dataset, delivered at once.
    Done(Dataset),
    Error(String),
}

/// Reads a dataset file and normalizes it, reporting over a channel so it
/// can run on a worker thread.
pub struct Loader {
    cancel: Arc<AtomicBool>,
    size_scale: f64,
}

impl Loader {
    pub fn new(cancel: Arc<AtomicBool>, size_scale: f64) -> Self {
        Self { cancel, size_scale }
    }

    pub fn load(&self, path: PathBuf, tx: Sender<LoadMsg>) {
        let msg = match self.read(&path, &tx) {
            Ok(Some(dataset)) => {
                info!(
                    path = %path.display(),
                    time_points = dataset.time_points.len(),
                    issues = dataset.issues.len(),
                    "dataset ready"
                );
                LoadMsg::Done(dataset)
            }
            Ok(None) => LoadMsg::Error("load cancelled".to_string()),
            Err(e) => {
                warn!(path = %path.display(), "{e}");
                LoadMsg::Error(e.to_string())
            }
        };
        let _ = tx.send(msg);
    }

    fn read(&self, path: &Path, tx: &Sender<LoadMsg>) -> Result<Option<Dataset>, LoadError> {
        let text = std::fs::read_to_string(path)?;
        let raw = parse(&text)?;
        let total = raw.len();

        let mut dataset = Dataset::default();
        for (parsed, tp) in raw.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }
            let before = dataset.issues.len();
            dataset
                .time_points
                .push(normalize_time_point(tp, self.size_scale, &mut dataset.issues));
            for issue in &dataset.issues[before..] {
                let _ = tx.send(LoadMsg::Issue(issue.clone()));
            }
            let _ = tx.send(LoadMsg::Progress {
                parsed: parsed + 1,
                total,
            });
        }
        Ok(Some(dataset))
    }
}

/// Read and normalize a dataset on the calling thread.
pub fn load_path(path: impl AsRef<Path>, size_scale: f64) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(crate::normalize::normalize(&parse(&text)?, size_scale))
}
