//! Error types for job descriptor construction and submission

use thiserror::Error;

use crate::jobs::request::RequestValidationError;

#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error while submitting a Job
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Failed to render a descriptor
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request failed validation before any descriptor was built
    #[error("Invalid request: {}", describe(.0))]
    InvalidRequest(Vec<RequestValidationError>),

    /// Job selector does not select the pods of its own template
    #[error("Label selector of Job {0} does not match its pod template labels")]
    SelectorMismatch(String),

    /// Job shell carries no labels to build a selector from
    #[error("Job {0} has no labels to select its pods with")]
    MissingLabels(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

fn describe(errors: &[RequestValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
