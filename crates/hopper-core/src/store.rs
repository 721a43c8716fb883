//! The on-disk item collection.
//!
//! One `items.json` per store directory holds the whole queue. Every mutating
//! operation is a full load -> mutate -> save cycle performed while holding an
//! advisory lock on `items.json.lock`, so concurrent `hopper` processes queue
//! up behind each other instead of silently dropping writes. Reads take no
//! lock; saves go through a temp file and a rename, so a reader sees either
//! the previous or the next document, never a partial one.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::item::{Item, ItemStatus};
use crate::resolve::{resolve_index, resolve_token_index};
use crate::transition;

pub const ITEMS_FILE: &str = "items.json";
const LOCK_FILE: &str = "items.json.lock";
const TEMP_FILE: &str = "items.json.tmp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    /// Queued and in-progress items.
    #[default]
    Active,
    All,
    Completed,
}

impl ListFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            ListFilter::Active => {
                matches!(item.status, ItemStatus::Queued | ItemStatus::InProgress)
            }
            ListFilter::All => true,
            ListFilter::Completed => item.status == ItemStatus::Completed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemStore {
    dir: PathBuf,
}

impl ItemStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn items_path(&self) -> PathBuf {
        self.dir.join(ITEMS_FILE)
    }

    /// Read the whole collection.
    ///
    /// A missing document is an empty queue. So is one that cannot be read or
    /// parsed: the next save replaces it.
    pub fn load(&self) -> Vec<Item> {
        let path = self.items_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "items document unreadable; starting fresh"
                );
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Item>>(&text) {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "items document corrupt; starting fresh"
                );
                Vec::new()
            }
        }
    }

    pub fn save(&self, items: &[Item]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut body = serde_json::to_string_pretty(items)?;
        body.push('\n');
        let tmp = self.dir.join(TEMP_FILE);
        fs::write(&tmp, body)?;
        fs::rename(&tmp, self.items_path())?;
        Ok(())
    }

    /// Prepend `item`, so listings show the newest work first.
    pub fn add(&self, item: Item) -> Result<Item> {
        self.mutate(|items| {
            items.insert(0, item.clone());
            debug!(id = %item.id, "item added");
            Ok(item)
        })
    }

    pub fn find(&self, id: &str) -> Result<Item> {
        let items = self.load();
        let idx = resolve_index(&items, id)?;
        Ok(items[idx].clone())
    }

    pub fn list(&self, filter: ListFilter) -> Vec<Item> {
        self.load()
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect()
    }

    /// Claim the oldest queued item by creation time.
    ///
    /// `Ok(None)` means nothing is queued; the document is left untouched.
    pub fn claim_next(&self, agent: Option<&str>) -> Result<Option<Item>> {
        let _lock = StoreLock::acquire(&self.dir)?;
        let mut items = self.load();
        let Some(idx) = transition::next_queued_index(&items) else {
            return Ok(None);
        };
        transition::claim(&mut items[idx], agent, Utc::now())?;
        self.save(&items)?;
        debug!(id = %items[idx].id, agent = ?agent, "item claimed");
        Ok(Some(items[idx].clone()))
    }

    pub fn complete(
        &self,
        token: &str,
        agent: Option<&str>,
        result: Option<&str>,
    ) -> Result<Item> {
        self.mutate(|items| {
            let idx = resolve_token_index(items, token)?;
            transition::complete(&mut items[idx], agent, result, Utc::now())?;
            debug!(id = %items[idx].id, agent = ?agent, "item completed");
            Ok(items[idx].clone())
        })
    }

    pub fn requeue(&self, id: &str, reason: &str, agent: Option<&str>) -> Result<Item> {
        transition::validate_reason(reason)?;
        self.mutate(|items| {
            let idx = resolve_index(items, id)?;
            transition::requeue(&mut items[idx], reason, agent)?;
            debug!(id = %items[idx].id, reason, "item requeued");
            Ok(items[idx].clone())
        })
    }

    pub fn cancel(&self, id: &str) -> Result<Item> {
        self.mutate(|items| {
            let idx = resolve_index(items, id)?;
            transition::cancel(&mut items[idx], Utc::now())?;
            debug!(id = %items[idx].id, "item cancelled");
            Ok(items[idx].clone())
        })
    }

    /// Run `apply` against the freshly loaded collection under the store lock
    /// and persist the result. Nothing is written when `apply` fails.
    fn mutate<T>(&self, apply: impl FnOnce(&mut Vec<Item>) -> Result<T>) -> Result<T> {
        let _lock = StoreLock::acquire(&self.dir)?;
        let mut items = self.load();
        let value = apply(&mut items)?;
        self.save(&items)?;
        Ok(value)
    }
}

/// Exclusive advisory lock released on drop.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_returns_empty_when_document_missing() {
        let temp = TempDir::new().expect("tempdir");
        let store = ItemStore::new(temp.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_discards_corrupt_document() {
        let temp = TempDir::new().expect("tempdir");
        let store = ItemStore::new(temp.path());
        fs::write(store.items_path(), "{ not json").expect("write");
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_writes_pretty_json_with_trailing_newline() {
        let temp = TempDir::new().expect("tempdir");
        let store = ItemStore::new(temp.path().join("nested").join("dir"));
        store.save(&[Item::new("A", "desc")]).expect("save");

        let text = fs::read_to_string(store.items_path()).expect("read");
        assert!(text.starts_with("[\n  {"));
        assert!(text.ends_with("]\n"));
        assert!(!temp.path().join("nested/dir").join(TEMP_FILE).exists());
    }

    #[test]
    fn list_filters_by_status() {
        let temp = TempDir::new().expect("tempdir");
        let store = ItemStore::new(temp.path());
        let mut completed = Item::new("Done", "d");
        completed.status = ItemStatus::Completed;
        let mut cancelled = Item::new("Cancelled", "c");
        cancelled.status = ItemStatus::Cancelled;
        let mut active = Item::new("Active", "a");
        active.status = ItemStatus::InProgress;
        let queued = Item::new("Queued", "q");
        store
            .save(&[queued, active, completed, cancelled])
            .expect("save");

        let titles = |filter| -> Vec<String> {
            store.list(filter).into_iter().map(|item| item.title).collect()
        };
        assert_eq!(titles(ListFilter::Active), vec!["Queued", "Active"]);
        assert_eq!(titles(ListFilter::Completed), vec!["Done"]);
        assert_eq!(titles(ListFilter::All).len(), 4);
    }

    #[test]
    fn failed_transition_leaves_document_untouched() {
        let temp = TempDir::new().expect("tempdir");
        let store = ItemStore::new(temp.path());
        let item = Item::new("A", "desc");
        store.save(&[item.clone()]).expect("save");
        let before = fs::read_to_string(store.items_path()).expect("read");

        assert!(store.requeue(&item.id, "reason", None).is_err());
        assert_eq!(fs::read_to_string(store.items_path()).expect("read"), before);
    }
}
