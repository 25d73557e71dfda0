use thiserror::Error;

/// Failures while interpreting an inbound event payload.
///
/// `Malformed` means the payload itself could not be read and `Shape` means a
/// known field has the wrong type; both must surface as a fatal error. `InvalidEvent` means the payload was readable but lacks a
/// field an accessor needs; callers usually turn it into a skip.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("event payload has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("{0}")]
    InvalidEvent(String),
}

/// Failures while building a branch or artifact name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("project name must not be empty")]
    EmptyProject,

    #[error("project name '{0}' consists only of numeric tokens and cannot be decoded unambiguously")]
    AmbiguousProject(String),
}

/// Failures while loading a project's `configuration.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reviewer '{username}' has maxOpenPRs of 0; it must be at least 1")]
    ZeroCapacity { username: String },

    #[error("reviewer username must not be empty")]
    EmptyUsername,

    #[error("reviewer '{0}' is listed more than once")]
    DuplicateReviewer(String),
}

/// Failures while validating a project's `spec.md`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("spec contains no checklist tasks (expected lines like '- [ ] task')")]
    NoTasks,
}
