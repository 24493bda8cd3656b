//! Wires detection and logging to document change notifications.

use crate::app::config::SharedSettings;
use crate::app::detector::{scan_document, RegexDetector, TaskScanner};
use crate::app::logger::TaskLogger;
use crate::app::models::{ManualRun, Subscription};
use crate::app::store::{DocumentStore, Entry};
use anyhow::Result;
use std::rc::Rc;

/// Source of "document changed" notifications.
pub trait ChangeFeed {
    fn subscribe(&mut self) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
}

pub struct TaskLogPlugin {
    settings: SharedSettings,
    store: Rc<dyn DocumentStore>,
    scanner: Box<dyn TaskScanner>,
    logger: TaskLogger,
    subscription: Option<Subscription>,
}

impl TaskLogPlugin {
    pub fn new(store: Rc<dyn DocumentStore>, settings: SharedSettings) -> Self {
        Self {
            logger: TaskLogger::new(store.clone(), settings.clone()),
            settings,
            store,
            scanner: Box::new(RegexDetector),
            subscription: None,
        }
    }

    pub fn logger(&self) -> &TaskLogger {
        &self.logger
    }

    /// Registers with the feed. Calling it again while registered does nothing.
    pub fn setup(&mut self, feed: &mut dyn ChangeFeed) {
        if self.subscription.is_none() {
            let subscription = feed.subscribe();
            log::debug!("Subscribed to document changes ({})", subscription.id);
            self.subscription = Some(subscription);
        }
    }

    /// Releases the subscription if there is one. Safe to call repeatedly.
    pub fn teardown(&mut self, feed: &mut dyn ChangeFeed) {
        if let Some(subscription) = self.subscription.take() {
            log::debug!("Releasing subscription {}", subscription.id);
            feed.unsubscribe(subscription);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Logs every completed task in a changed document. Failures are
    /// reported, never returned. Returns how many entries were written.
    pub fn handle_change(&self, path: &str) -> usize {
        let (enabled, log_file_name) = {
            let settings = self.settings.borrow();
            (settings.enabled, settings.log_file_name.clone())
        };
        if !enabled {
            return 0;
        }
        // Our own writes to the log show up as changes too.
        if !log_file_name.is_empty() && path.contains(&log_file_name) {
            return 0;
        }

        let tasks = scan_document(self.scanner.as_ref(), self.store.as_ref(), path);
        let mut logged = 0;
        for task in &tasks {
            if let Err(err) = self.logger.record(task, path) {
                log::error!("Error handling file change: {:#}", err);
                break;
            }
            logged += 1;
        }
        if logged > 0 {
            log::info!("Logged {} completed task(s) from {}", logged, path);
        }
        logged
    }

    /// Manual trigger for a single document.
    pub fn log_document(&self, path: Option<&str>) -> Result<ManualRun> {
        let path = match path {
            Some(p) if self.store.lookup(p) == Some(Entry::Document) => p,
            _ => return Ok(ManualRun::NoActiveDocument),
        };

        let tasks = scan_document(self.scanner.as_ref(), self.store.as_ref(), path);
        if tasks.is_empty() {
            return Ok(ManualRun::NoTasks);
        }

        for task in &tasks {
            self.logger.record(task, path)?;
        }
        Ok(ManualRun::Logged(tasks.len()))
    }
}
