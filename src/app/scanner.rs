use crate::app::models::Subscription;
use crate::app::plugin::ChangeFeed;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use pathdiff::diff_paths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Finds documents in a vault directory and reports which ones changed.
pub struct VaultScanner {
    root: PathBuf,
    include_set: GlobSet,
    exclude_set: GlobSet,
    seen: HashMap<String, SystemTime>,
    subscribers: Vec<u64>,
    next_id: u64,
}

impl VaultScanner {
    pub fn new(root: PathBuf, include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            root,
            include_set: build_globset(include)?,
            exclude_set: build_globset(exclude)?,
            seen: HashMap::new(),
            subscribers: Vec::new(),
            next_id: 0,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.subscribers.is_empty()
    }

    /// Every matching document, as vault-relative paths in sorted order.
    pub fn sweep(&self) -> Vec<String> {
        self.documents().into_iter().map(|(rel, _)| rel).collect()
    }

    /// Records modification times without reporting anything.
    pub fn baseline(&mut self) {
        self.seen = self
            .documents()
            .into_iter()
            .filter_map(|(rel, path)| modified(&path).map(|t| (rel, t)))
            .collect();
    }

    /// Documents that appeared or were modified since the last poll or baseline.
    pub fn poll(&mut self) -> Vec<String> {
        let mut changed = Vec::new();

        for (rel, path) in self.documents() {
            let Some(mtime) = modified(&path) else {
                continue;
            };
            let is_new = match self.seen.get(&rel) {
                Some(previous) => mtime > *previous,
                None => true,
            };
            if is_new {
                changed.push(rel.clone());
            }
            self.seen.insert(rel, mtime);
        }

        changed
    }

    fn documents(&self) -> Vec<(String, PathBuf)> {
        let mut docs = Vec::new();

        // Hidden folders (e.g. the editor's own config dir) are skipped.
        let walker = WalkBuilder::new(&self.root).git_ignore(true).build();

        for result in walker {
            match result {
                Ok(entry) => {
                    if let Some(doc) = self.process_entry(entry.path()) {
                        docs.push(doc);
                    }
                }
                Err(err) => log::warn!("Error walking entry: {}", err),
            }
        }

        docs.sort();
        docs
    }

    fn process_entry(&self, path: &Path) -> Option<(String, PathBuf)> {
        if !path.is_file() {
            return None;
        }

        let relative = diff_paths(path, &self.root)?;

        if self.exclude_set.is_match(&relative) {
            return None;
        }
        if !self.include_set.is_empty() && !self.include_set.is_match(&relative) {
            return None;
        }

        let relative_str = relative.to_string_lossy().replace('\\', "/");
        Some((relative_str, path.to_path_buf()))
    }
}

impl ChangeFeed for VaultScanner {
    fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        self.subscribers.push(self.next_id);
        Subscription { id: self.next_id }
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscribers.retain(|id| *id != subscription.id);
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    match path.metadata().and_then(|m| m.modified()) {
        Ok(t) => Some(t),
        Err(err) => {
            log::warn!("Cannot stat {:?}: {}", path, err);
            None
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).context(format!("Invalid glob pattern: {}", pat))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn md_only() -> Vec<String> {
        vec!["**/*.md".to_string()]
    }

    fn vault() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("daily")).unwrap();
        fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
        fs::write(dir.path().join("todo.md"), "- [x] a").unwrap();
        fs::write(dir.path().join("daily/2023-01-01.md"), "- [ ] b").unwrap();
        fs::write(dir.path().join("image.png"), "png").unwrap();
        fs::write(dir.path().join(".obsidian/workspace.md"), "hidden").unwrap();
        dir
    }

    fn touch_later(path: &Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    }

    #[test]
    fn sweep_lists_matching_documents() {
        let dir = vault();
        let scanner = VaultScanner::new(dir.path().to_path_buf(), &md_only(), &[]).unwrap();
        assert_eq!(scanner.sweep(), vec!["daily/2023-01-01.md", "todo.md"]);
    }

    #[test]
    fn exclude_overrides_include() {
        let dir = vault();
        let scanner = VaultScanner::new(
            dir.path().to_path_buf(),
            &md_only(),
            &["daily/**".to_string()],
        )
        .unwrap();
        assert_eq!(scanner.sweep(), vec!["todo.md"]);
    }

    #[test]
    fn empty_include_matches_everything_visible() {
        let dir = vault();
        let scanner = VaultScanner::new(dir.path().to_path_buf(), &[], &[]).unwrap();
        assert_eq!(scanner.sweep(), vec!["daily/2023-01-01.md", "image.png", "todo.md"]);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let dir = vault();
        assert!(VaultScanner::new(dir.path().to_path_buf(), &["[".to_string()], &[]).is_err());
    }

    #[test]
    fn poll_reports_modified_and_new_documents() {
        let dir = vault();
        let mut scanner = VaultScanner::new(dir.path().to_path_buf(), &md_only(), &[]).unwrap();

        scanner.baseline();
        assert!(scanner.poll().is_empty());

        touch_later(&dir.path().join("todo.md"));
        fs::write(dir.path().join("new.md"), "- [x] c").unwrap();
        assert_eq!(scanner.poll(), vec!["new.md", "todo.md"]);
        assert!(scanner.poll().is_empty());
    }

    #[test]
    fn subscriptions_are_tracked() {
        let dir = vault();
        let mut scanner = VaultScanner::new(dir.path().to_path_buf(), &md_only(), &[]).unwrap();
        assert!(!scanner.is_active());

        let sub = scanner.subscribe();
        assert!(scanner.is_active());
        scanner.unsubscribe(sub);
        assert!(!scanner.is_active());
    }
}
