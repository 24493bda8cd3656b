use crate::app::config::SharedSettings;
use crate::app::formatter::{EntryFormatter, LOG_HEADER};
use crate::app::models::CompletedTask;
use crate::app::store::{is_absolute_path, DocumentStore, Entry};
use anyhow::{Context, Result};
use std::path::Path;
use std::rc::Rc;

/// Formats completed tasks and appends them to the log document.
pub struct TaskLogger {
    store: Rc<dyn DocumentStore>,
    settings: SharedSettings,
}

impl TaskLogger {
    pub fn new(store: Rc<dyn DocumentStore>, settings: SharedSettings) -> Self {
        Self { store, settings }
    }

    /// Where the log document lives, given the current settings.
    pub fn log_file_path(&self) -> String {
        let settings = self.settings.borrow();
        if settings.log_directory.is_empty() {
            return settings.log_file_name.clone();
        }
        Path::new(&settings.log_directory)
            .join(&settings.log_file_name)
            .to_string_lossy()
            .to_string()
    }

    pub fn format(&self, task: &CompletedTask, source: &str) -> String {
        EntryFormatter::format_entry(task, source, &self.settings.borrow())
    }

    pub fn record(&self, task: &CompletedTask, source: &str) -> Result<()> {
        let path = self.log_file_path();
        let entry = self.format(task, source);
        self.append_entry(&path, &entry)
            .with_context(|| format!("Error logging task from {} line {}", source, task.line_number))
    }

    /// Appends `entry`, creating the document with its header on first use.
    ///
    /// If the write fails and the log directory is relative, the directory is
    /// created and the write retried once.
    pub fn append_entry(&self, path: &str, entry: &str) -> Result<()> {
        let err = match self.write_entry(path, entry) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        log::error!("Error writing to log file {}: {:#}", path, err);

        let directory = self.settings.borrow().log_directory.clone();
        if directory.is_empty() || is_absolute_path(&directory) {
            return Err(err);
        }

        self.ensure_directory(&directory)?;
        self.write_entry(path, entry)
            .with_context(|| format!("Retry after creating {} failed", directory))
    }

    fn write_entry(&self, path: &str, entry: &str) -> Result<()> {
        match self.store.lookup(path) {
            None => self.store.create(path, &format!("{}{}", LOG_HEADER, entry)),
            Some(_) => {
                let current = self.store.read(path)?;
                self.store.overwrite(path, &format!("{}{}", current, entry))
            }
        }
    }

    fn ensure_directory(&self, dir: &str) -> Result<()> {
        if self.store.lookup(dir).is_none() {
            self.store
                .create_dir(dir)
                .with_context(|| format!("Error creating directory {}", dir))?;
        }
        Ok(())
    }

    /// Current log content, or an empty string when there is none.
    pub fn get_content(&self) -> String {
        let path = self.log_file_path();
        if self.store.lookup(&path) != Some(Entry::Document) {
            return String::new();
        }
        match self.store.read(&path) {
            Ok(content) => content,
            Err(err) => {
                log::error!("Error reading log file {}: {:#}", path, err);
                String::new()
            }
        }
    }

    /// Resets the log to its header. Does nothing if there is no log yet.
    pub fn clear(&self) -> Result<()> {
        let path = self.log_file_path();
        if self.store.lookup(&path) == Some(Entry::Document) {
            self.store
                .overwrite(&path, LOG_HEADER)
                .with_context(|| format!("Error clearing log file {}", path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{shared, Settings};
    use crate::app::store::testing::MemoryStore;
    use chrono::{Local, TimeZone};

    fn task() -> CompletedTask {
        CompletedTask {
            text: "Test completed task".to_string(),
            full_line: "- [x] Test completed task".to_string(),
            line_number: 5,
            completed_at: Local.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).single().unwrap(),
        }
    }

    fn logger_with(store: &Rc<MemoryStore>, settings: Settings) -> TaskLogger {
        TaskLogger::new(store.clone(), shared(settings))
    }

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.include_timestamp = false;
        settings
    }

    #[test]
    fn path_in_vault_root() {
        let store = Rc::new(MemoryStore::default());
        assert_eq!(logger_with(&store, Settings::default()).log_file_path(), "task-log.md");
    }

    #[test]
    fn path_in_relative_directory() {
        let store = Rc::new(MemoryStore::default());
        let mut settings = Settings::default();
        settings.log_directory = "logs".to_string();
        let expected = Path::new("logs").join("task-log.md");
        assert_eq!(
            logger_with(&store, settings).log_file_path(),
            expected.to_string_lossy()
        );
    }

    #[test]
    fn path_in_absolute_directory() {
        let store = Rc::new(MemoryStore::default());
        for dir in ["/Users/username/Documents/logs", "C:\\Users\\username\\Documents\\logs"] {
            let mut settings = Settings::default();
            settings.log_directory = dir.to_string();
            let expected = Path::new(dir).join("task-log.md");
            assert_eq!(
                logger_with(&store, settings).log_file_path(),
                expected.to_string_lossy()
            );
        }
    }

    #[test]
    fn first_append_creates_document_with_header() {
        let store = Rc::new(MemoryStore::default());
        let logger = logger_with(&store, Settings::default());

        logger.append_entry("test-log.md", "test entry").unwrap();

        assert_eq!(store.doc("test-log.md").unwrap(), format!("{}test entry", LOG_HEADER));
    }

    #[test]
    fn later_appends_concatenate_without_second_header() {
        let store = Rc::new(MemoryStore::default());
        let logger = logger_with(&store, Settings::default());

        logger.append_entry("log.md", "one\n").unwrap();
        let before = store.doc("log.md").unwrap();
        logger.append_entry("log.md", "two\n").unwrap();

        let after = store.doc("log.md").unwrap();
        assert_eq!(after, format!("{}two\n", before));
        assert_eq!(after.matches("# Task Log").count(), 1);
    }

    #[test]
    fn missing_relative_directory_is_created_and_retried() {
        let store = Rc::new(MemoryStore::default());
        store.require_folders.set(true);
        let mut settings = quiet_settings();
        settings.log_directory = "logs".to_string();
        let logger = logger_with(&store, settings);

        logger.record(&task(), "test.md").unwrap();

        let path = logger.log_file_path();
        assert!(store.folders.borrow().contains("logs"));
        assert_eq!(store.write_attempts.get(), 2);
        assert!(store.doc(&path).unwrap().ends_with("- [x] Test completed task\n---\n"));
    }

    #[test]
    fn retry_happens_only_once() {
        let store = Rc::new(MemoryStore::default());
        store.fail_writes.set(true);
        let mut settings = quiet_settings();
        settings.log_directory = "logs".to_string();
        let logger = logger_with(&store, settings);

        assert!(logger.record(&task(), "test.md").is_err());
        assert!(store.folders.borrow().contains("logs"));
        assert_eq!(store.write_attempts.get(), 2);
    }

    #[test]
    fn absolute_directory_failures_propagate_without_retry() {
        let store = Rc::new(MemoryStore::default());
        store.require_folders.set(true);
        let mut settings = quiet_settings();
        settings.log_directory = "/abs/logs".to_string();
        let logger = logger_with(&store, settings);

        assert!(logger.record(&task(), "test.md").is_err());
        assert!(store.folders.borrow().is_empty());
        assert_eq!(store.write_attempts.get(), 1);
    }

    #[test]
    fn write_failure_in_vault_root_propagates() {
        let store = Rc::new(MemoryStore::default());
        store.fail_writes.set(true);
        let logger = logger_with(&store, Settings::default());

        let err = logger.record(&task(), "test.md").unwrap_err();
        assert_eq!(store.write_attempts.get(), 1);
        assert!(format!("{:#}", err).contains("write failed"));
    }

    #[test]
    fn content_and_clear() {
        let store = Rc::new(MemoryStore::default());
        let logger = logger_with(&store, quiet_settings());

        assert_eq!(logger.get_content(), "");
        logger.clear().unwrap();
        assert!(store.doc("task-log.md").is_none());

        logger.record(&task(), "test.md").unwrap();
        assert!(logger.get_content().contains("**Source:** [[test]]"));

        logger.clear().unwrap();
        assert_eq!(logger.get_content(), LOG_HEADER);
    }

    #[test]
    fn settings_changes_apply_to_next_record() {
        let store = Rc::new(MemoryStore::default());
        let settings = shared(quiet_settings());
        let logger = TaskLogger::new(store.clone(), settings.clone());

        logger.record(&task(), "a.md").unwrap();
        settings.borrow_mut().include_source_file = false;
        logger.record(&task(), "b.md").unwrap();

        let content = logger.get_content();
        assert!(content.contains("[[a]]"));
        assert!(!content.contains("[[b]]"));
    }
}
