//! Out-of-band reporting of terminal upload outcomes
//!
//! The pipeline hands every failure, and branding successes, to an injected
//! [`FeedbackReporter`] instead of returning them to the caller.

pub mod mock;

pub use mock::RecordingFeedback;

use crate::error::PipelineError;
use std::fmt;
use std::sync::Arc;

pub type ConfirmCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

#[derive(Clone)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub title: String,
    pub message: String,
    /// Invoked when the user acknowledges the report.
    pub on_confirm: Option<ConfirmCallback>,
}

impl Feedback {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Success,
            title: title.into(),
            message: message.into(),
            on_confirm: None,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Error,
            title: title.into(),
            message: message.into(),
            on_confirm: None,
        }
    }

    pub fn with_on_confirm(mut self, callback: ConfirmCallback) -> Self {
        self.on_confirm = Some(callback);
        self
    }

    pub fn confirm(&self) {
        if let Some(callback) = &self.on_confirm {
            callback();
        }
    }
}

impl From<&PipelineError> for Feedback {
    fn from(err: &PipelineError) -> Self {
        Feedback::error(err.title(), err.user_message())
    }
}

impl fmt::Debug for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feedback")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("message", &self.message)
            .field("on_confirm", &self.on_confirm.is_some())
            .finish()
    }
}

pub trait FeedbackReporter: Send + Sync {
    fn report(&self, feedback: Feedback);
}

/// Reporter for headless callers: writes each report to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl FeedbackReporter for TracingFeedback {
    fn report(&self, feedback: Feedback) {
        match feedback.kind {
            FeedbackKind::Success => tracing::info!("{}: {}", feedback.title, feedback.message),
            FeedbackKind::Error => tracing::error!("{}: {}", feedback.title, feedback.message),
        }
    }
}
