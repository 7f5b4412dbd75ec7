use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ferrite_classify::{ClassificationResult, Pipeline};

/// How many past predictions the page lists.
const RECENT_LIMIT: usize = 8;

/// One finished request, kept for the "recent" list.
#[derive(Debug, Clone)]
pub struct RecentResult {
    pub file_name: String,
    pub result: ClassificationResult,
}

pub struct StudioState {
    /// The loaded model, labels and normalizer. Read-only after startup.
    pub pipeline:   Pipeline,
    /// Model file stem shown in the header.
    pub model_name: String,
    /// Number of ranked classes shown per prediction.
    pub top_k:      usize,
    /// Newest first.
    recent:         Mutex<VecDeque<RecentResult>>,
}

impl StudioState {
    pub fn new(pipeline: Pipeline, model_name: String, top_k: usize) -> Self {
        StudioState {
            pipeline,
            model_name,
            top_k: top_k.max(1),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_LIMIT)),
        }
    }

    pub fn record(&self, file_name: String, result: ClassificationResult) {
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.push_front(RecentResult { file_name, result });
        recent.truncate(RECENT_LIMIT);
    }

    pub fn recent(&self) -> Vec<RecentResult> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }
}

/// Handle passed to every request thread.
pub type SharedState = Arc<StudioState>;
