//! Embedded document store.
//!
//! A directory holds one subdirectory per collection with one JSON file per
//! document. The wrapper uses four
//! collections: `common` (the poll offset), `users`, `messages` and `chats`.

mod collection;
pub mod records;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde_json::json;

pub use collection::{
    from_document, to_document, Document, DocumentStore, Order, Query, ID_FIELD,
};

use crate::{errors::Error, Result};

/// `_id` of the singleton offset record in `common`.
pub const OFFSET_DOC_ID: i64 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Common,
    Users,
    Messages,
    Chats,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Common => "common",
            Collection::Users => "users",
            Collection::Messages => "messages",
            Collection::Chats => "chats",
        }
    }

    /// Collections opened for a bot; `chats` only when chats are tracked.
    pub fn for_profile(track_chats: bool) -> Vec<Collection> {
        let mut out = vec![Collection::Common, Collection::Users, Collection::Messages];
        if track_chats {
            out.push(Collection::Chats);
        }
        out
    }
}

/// The set of open collections under one data directory.
#[derive(Debug)]
pub struct Database {
    root: PathBuf,
    stores: HashMap<Collection, DocumentStore>,
}

impl Database {
    /// Open (or create) `collections` under `root`, creating the directory.
    pub fn open(root: impl AsRef<Path>, collections: &[Collection]) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut stores = HashMap::new();
        for &c in collections {
            stores.insert(c, DocumentStore::open(&root, c.as_str())?);
        }
        tracing::debug!(root = %root.display(), count = stores.len(), "opened document store");
        Ok(Self { root, stores })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_open(&self, collection: Collection) -> bool {
        self.stores.contains_key(&collection)
    }

    pub fn store(&self, collection: Collection) -> Result<&DocumentStore> {
        self.stores.get(&collection).ok_or_else(|| {
            Error::NotInitialized(format!(
                "the {} store is not open for this bot",
                collection.as_str()
            ))
        })
    }

    /// Highest update id already consumed, if any poll has succeeded.
    pub fn last_update_id(&self) -> Result<Option<i64>> {
        let doc = self.store(Collection::Common)?.find_by_id(OFFSET_DOC_ID)?;
        Ok(doc.and_then(|d| d.get("last_update_id").and_then(|v| v.as_i64())))
    }

    pub fn set_last_update_id(&self, update_id: i64) -> Result<()> {
        let doc = to_document(&json!({
            "_id": OFFSET_DOC_ID,
            "last_update_id": update_id,
        }))?;
        self.store(Collection::Common)?.update_or_insert(doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_marker_is_a_singleton() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), &Collection::for_profile(false)).unwrap();
        assert_eq!(db.last_update_id().unwrap(), None);

        db.set_last_update_id(7).unwrap();
        db.set_last_update_id(9).unwrap();
        assert_eq!(db.last_update_id().unwrap(), Some(9));
        assert_eq!(db.store(Collection::Common).unwrap().len().unwrap(), 1);
    }

    #[test]
    fn missing_collection_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("nested/db"), &Collection::for_profile(false))
            .unwrap();
        assert!(dir.path().join("nested/db").is_dir());
        assert!(!db.is_open(Collection::Chats));
        assert!(matches!(
            db.store(Collection::Chats),
            Err(Error::NotInitialized(_))
        ));
    }
}
