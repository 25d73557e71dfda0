//! GitHub Actions step outputs and workflow commands.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use claudestep_core::hash::short_hash;

use crate::error::GhError;

/// Sink for step outputs and workflow annotations.
pub trait StepOutputs {
    fn write_output(&mut self, key: &str, value: &str) -> Result<(), GhError>;

    /// Emit an `::error::` annotation.
    fn set_error(&mut self, message: &str);

    fn notice(&mut self, message: &str);

    fn warning(&mut self, message: &str);
}

/// Escape a workflow command payload.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// One `$GITHUB_OUTPUT` record. Multiline values use the heredoc form.
pub fn format_output(key: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", short_hash(value));
        format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{key}={value}\n")
    }
}

/// Writes to the `$GITHUB_OUTPUT` file, or to stdout when running outside
/// Actions.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOutputs {
    output_file: Option<PathBuf>,
}

impl WorkflowOutputs {
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self {
            output_file: output_file.filter(|p| !p.as_os_str().is_empty()),
        }
    }
}

impl StepOutputs for WorkflowOutputs {
    fn write_output(&mut self, key: &str, value: &str) -> Result<(), GhError> {
        let record = format_output(key, value);
        match &self.output_file {
            Some(path) => {
                let mut f = OpenOptions::new().create(true).append(true).open(path)?;
                f.write_all(record.as_bytes())?;
            }
            None => print!("{record}"),
        }
        tracing::debug!(key = key, "wrote step output");
        Ok(())
    }

    fn set_error(&mut self, message: &str) {
        println!("::error::{}", escape_data(message));
    }

    fn notice(&mut self, message: &str) {
        println!("::notice::{}", escape_data(message));
    }

    fn warning(&mut self, message: &str) {
        println!("::warning::{}", escape_data(message));
    }
}

/// In-memory [`StepOutputs`] for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutputs {
    pub outputs: Vec<(String, String)>,
    pub errors: Vec<String>,
    pub notices: Vec<String>,
    pub warnings: Vec<String>,
}

impl RecordingOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value written for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl StepOutputs for RecordingOutputs {
    fn write_output(&mut self, key: &str, value: &str) -> Result<(), GhError> {
        self.outputs.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn set_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
