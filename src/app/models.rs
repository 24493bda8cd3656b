use chrono::{DateTime, Local};

/// A completed checklist item found while scanning a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    /// Label captured after the `- [x] ` marker.
    pub text: String,
    /// The source line exactly as authored.
    pub full_line: String,
    /// 1-based line index in the source document.
    pub line_number: usize,
    /// When the task was detected (documents carry no completion time).
    pub completed_at: DateTime<Local>,
}

/// Result of the manual "log completed tasks from current document" command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualRun {
    NoActiveDocument,
    NoTasks,
    Logged(usize),
}

impl ManualRun {
    pub fn count(&self) -> usize {
        match self {
            ManualRun::Logged(n) => *n,
            _ => 0,
        }
    }

    /// Short user-facing message for the outcome.
    pub fn notice(&self) -> String {
        match self {
            ManualRun::NoActiveDocument => "No active file".to_string(),
            ManualRun::NoTasks => "No completed tasks found in current file".to_string(),
            ManualRun::Logged(n) => format!("Logged {} completed task(s)", n),
        }
    }
}

/// Handle returned by a change feed when the orchestrator registers with it.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    pub id: u64,
}
