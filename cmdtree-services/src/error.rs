//! Pipeline failure type
//!
//! Every failure raised while a pipeline runs, whether a service returned an
//! error, a service panicked, or the default handler failed, is reported
//! through this one type.

use std::any::Any;
use thiserror::Error;

/// Stage name used when the failure happened inside the default handler
pub const DEFAULT_HANDLER_STAGE: &str = "default handler";

/// Uniform wrapper for unexpected failures raised during a pipeline run
///
/// The original failure is always kept as the error source.
#[derive(Debug, Error)]
#[error("{}", describe(.message, .stage))]
pub struct PipelineError {
    message: Option<String>,
    stage: String,
    #[source]
    cause: anyhow::Error,
}

fn describe(message: &Option<String>, stage: &str) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("pipeline stage '{}' failed", stage),
    }
}

impl PipelineError {
    /// Wrap a failure without a descriptive message
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self {
            message: None,
            stage: "pipeline".to_string(),
            cause: cause.into(),
        }
    }

    /// Wrap a failure with a message explaining it
    pub fn with_message(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            message: Some(message.into()),
            stage: "pipeline".to_string(),
            cause: cause.into(),
        }
    }

    pub(crate) fn at_stage(stage: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            message: None,
            stage: stage.into(),
            cause,
        }
    }

    pub(crate) fn from_panic(stage: impl Into<String>, payload: Box<dyn Any + Send>) -> Self {
        let stage = stage.into();
        let detail = panic_message(payload.as_ref());
        Self {
            message: Some(format!("pipeline stage '{}' panicked", stage)),
            stage,
            cause: anyhow::anyhow!("panic: {}", detail),
        }
    }

    /// Descriptive message, if one was supplied
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Name of the service (or the default handler) that failed
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// The original failure
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Try to view the original failure as a concrete error type
    pub fn downcast_cause_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.cause.downcast_ref::<E>()
    }

    /// Unwrap into the original failure
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
