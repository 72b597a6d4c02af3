use super::{Feedback, FeedbackReporter};
use std::sync::{Arc, Mutex};

/// Keeps every report so a UI (or a test) can read the latest one back.
#[derive(Clone, Default)]
pub struct RecordingFeedback {
    reports: Arc<Mutex<Vec<Feedback>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Feedback> {
        self.reports.lock().unwrap().clone()
    }

    pub fn latest(&self) -> Option<Feedback> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.reports.lock().unwrap().clear();
    }
}

impl FeedbackReporter for RecordingFeedback {
    fn report(&self, feedback: Feedback) {
        self.reports.lock().unwrap().push(feedback);
    }
}
