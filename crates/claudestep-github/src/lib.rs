pub mod comment;
pub mod error;
pub mod gh;
pub mod outputs;

pub use error::GhError;
pub use gh::{GhCli, GitHubApi};
pub use outputs::{RecordingOutputs, StepOutputs, WorkflowOutputs};
