//! Markdown checklist of a project (`spec.md`).

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::SpecError;
use crate::hash::short_hash;

/// One checklist line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTask {
    /// 1-based position among checklist lines.
    pub index: u32,
    pub description: String,
    pub completed: bool,
}

impl SpecTask {
    /// Hash suffix used for branches created from this task.
    pub fn hash(&self) -> String {
        short_hash(&self.description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecDocument {
    tasks: Vec<SpecTask>,
}

fn checklist_line() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+\[([ xX])\]\s+(.+?)\s*$").ok())
        .as_ref()
}

impl SpecDocument {
    pub fn parse(content: &str) -> Self {
        let Some(re) = checklist_line() else {
            return Self::default();
        };
        let mut tasks = Vec::new();
        for line in content.lines() {
            let Some(caps) = re.captures(line) else {
                continue;
            };
            let (Some(mark), Some(text)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            tasks.push(SpecTask {
                index: tasks.len() as u32 + 1,
                description: text.as_str().to_string(),
                completed: mark.as_str() != " ",
            });
        }
        Self { tasks }
    }

    pub fn tasks(&self) -> &[SpecTask] {
        &self.tasks
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.tasks.is_empty() {
            return Err(SpecError::NoTasks);
        }
        Ok(())
    }

    /// First unchecked task.
    pub fn next_pending(&self) -> Option<&SpecTask> {
        self.tasks.iter().find(|t| !t.completed)
    }

    /// First unchecked task whose index is not in `in_flight` (tasks that
    /// already have an open PR).
    pub fn next_pending_excluding(&self, in_flight: &BTreeSet<u32>) -> Option<&SpecTask> {
        self.tasks
            .iter()
            .find(|t| !t.completed && !in_flight.contains(&t.index))
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.len() - self.completed_count()
    }
}
