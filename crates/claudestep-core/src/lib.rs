pub mod autostart;
pub mod branch;
pub mod config;
pub mod cost;
pub mod error;
pub mod event;
pub mod hash;
pub mod project;
pub mod reviewer;
pub mod spec_doc;

pub use config::{ProjectConfiguration, ReviewerRecord};
pub use error::{ConfigError, EventError, NameError, SpecError};
pub use event::{EventContext, EventKind, EventOutcome, ResolveOptions, SkipDecision};
pub use project::Project;
pub use reviewer::{OpenPullRequest, ReviewerCapacityResult};
pub use spec_doc::SpecDocument;
