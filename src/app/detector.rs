use crate::app::models::CompletedTask;
use crate::app::store::DocumentStore;
use chrono::Local;
use regex::Regex;
use std::sync::LazyLock;

/// `- [x] label` or `- [X] label`, anchored at both ends. The label never
/// contains a line terminator, so CRLF lines do not match.
static COMPLETED_TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[[xX]\] ([^\r\n\x{2028}\x{2029}]+)$").unwrap());

/// A strategy for finding completed tasks in document text.
pub trait TaskScanner {
    fn scan(&self, text: &str) -> Vec<CompletedTask>;
}

/// Line-by-line checklist detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexDetector;

impl TaskScanner for RegexDetector {
    fn scan(&self, text: &str) -> Vec<CompletedTask> {
        let detected_at = Local::now();

        text.split('\n')
            .enumerate()
            .filter_map(|(index, line)| {
                extract_task_text(line).map(|label| CompletedTask {
                    text: label.to_string(),
                    full_line: line.to_string(),
                    line_number: index + 1,
                    completed_at: detected_at,
                })
            })
            .collect()
    }
}

pub fn is_completed_task_line(line: &str) -> bool {
    COMPLETED_TASK.is_match(line)
}

pub fn extract_task_text(line: &str) -> Option<&str> {
    COMPLETED_TASK
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Reads `path` from the store and scans it.
///
/// An unreadable document is reported and treated as having no tasks, so it
/// never holds up other documents.
pub fn scan_document(
    scanner: &dyn TaskScanner,
    store: &dyn DocumentStore,
    path: &str,
) -> Vec<CompletedTask> {
    match store.read(path) {
        Ok(text) => scanner.scan(&text),
        Err(err) => {
            log::error!("Error reading file {}: {:#}", path, err);
            Vec::new()
        }
    }
}
