//! Durable item store.
//!
//! Two collections, `active` (items still in flight) and `archive` (rendered
//! items awaiting or past approval), each a directory of one JSON file per
//! item. Writes go to a `.tmp` sibling and are renamed into place, so a reader
//! never observes a half-written item. Moving an item between collections is a
//! single `rename`, so an id exists in exactly one collection at any
//! observation point.
//!
//! There is no cross-process locking: two processes writing the *same item
//! file* are last-write-wins. Per-item files confine that race to one item
//! instead of clobbering a whole collection.
//!
//! A file that fails to parse is skipped with a warning rather than failing
//! the load; a corrupted record must not halt the pipeline. Accepted
//! data-loss tradeoff.

use crate::errors::StoreError;
use crate::model::Item;
use std::fs;
use std::path::{Path, PathBuf};

/// The two item collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Active,
    Archive,
}

impl Collection {
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Active => "active",
            Collection::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

pub struct ItemStore {
    data_dir: PathBuf,
}

impl ItemStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.dir_name())
    }

    fn item_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.json"))
    }

    /// Load every item in a collection, sorted by id (creation order, since
    /// ids carry a millisecond prefix). A missing directory is an empty
    /// collection, not an error.
    pub fn load(&self, collection: Collection) -> Result<Vec<Item>, StoreError> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| StoreError::ReadDir {
            path: dir.clone(),
            source,
        })?;

        let mut items = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str::<Item>(&text) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        eprintln!(
                            "Warning: skipping unparseable item record {}: {}",
                            path.display(),
                            e
                        );
                    }
                },
                Err(e) => {
                    eprintln!("Warning: skipping unreadable item record {}: {}", path.display(), e);
                }
            }
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    /// Write one item. Atomic from a reader's perspective (tmp + rename).
    pub fn save_item(&self, collection: Collection, item: &Item) -> Result<(), StoreError> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).map_err(|source| StoreError::WriteItem {
            id: item.id.clone(),
            source,
        })?;

        let json =
            serde_json::to_string_pretty(item).map_err(|source| StoreError::SerializeItem {
                id: item.id.clone(),
                source,
            })?;

        let path = self.item_path(collection, &item.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| StoreError::WriteItem {
                id: item.id.clone(),
                source,
            })
    }

    /// Replace the entire contents of a collection with `items`, removing
    /// records that are no longer present.
    pub fn replace(&self, collection: Collection, items: &[Item]) -> Result<(), StoreError> {
        for item in items {
            self.save_item(collection, item)?;
        }
        let keep: std::collections::HashSet<&str> =
            items.iter().map(|i| i.id.as_str()).collect();
        for existing in self.load(collection)? {
            if !keep.contains(existing.id.as_str()) {
                self.remove(collection, &existing.id)?;
            }
        }
        Ok(())
    }

    /// Move items between collections by renaming their record files. Atomic
    /// per item; an id absent from `from` is skipped, not an error.
    pub fn move_items(
        &self,
        ids: &[&str],
        from: Collection,
        to: Collection,
    ) -> Result<(), StoreError> {
        let to_dir = self.collection_dir(to);
        for id in ids {
            let src = self.item_path(from, id);
            if !src.exists() {
                continue;
            }
            fs::create_dir_all(&to_dir).map_err(|source| StoreError::MoveItem {
                id: id.to_string(),
                source,
            })?;
            let dst = self.item_path(to, id);
            fs::rename(&src, &dst).map_err(|source| StoreError::MoveItem {
                id: id.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Find an item by id, archive first (render moves successes to archive,
    /// so approval-driven lookups almost always land there).
    pub fn find(&self, id: &str) -> Result<Option<(Collection, Item)>, StoreError> {
        for collection in [Collection::Archive, Collection::Active] {
            let path = self.item_path(collection, id);
            if let Ok(text) = fs::read_to_string(&path)
                && let Ok(item) = serde_json::from_str::<Item>(&text)
            {
                return Ok(Some((collection, item)));
            }
        }
        Ok(None)
    }

    /// Overwrite an existing item in place.
    pub fn update_in_place(&self, collection: Collection, item: &Item) -> Result<(), StoreError> {
        self.save_item(collection, item)
    }

    fn remove(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let path = self.item_path(collection, id);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| StoreError::RemoveItem {
                id: id.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Destructively empty a collection. Used by `reset-state`.
    pub fn reset(&self, collection: Collection) -> Result<(), StoreError> {
        let dir = self.collection_dir(collection);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| StoreError::ReadDir {
                path: dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&dir).map_err(|source| StoreError::ReadDir { path: dir, source })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
