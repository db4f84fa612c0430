use crate::model::Entity;
use crate::store::KvStore;
use anyhow::Context;
use std::marker::PhantomData;
use tracing::warn;

/// Whole-collection CRUD for one entity kind.
///
/// Every read decodes the full stored array and every write re-serializes it.
/// A collection that cannot be decoded reads as empty; individual elements
/// that fail to decode (unknown status values, missing fields) are skipped.
pub struct Repo<'a, T: Entity> {
    store: &'a dyn KvStore,
    _kind: PhantomData<T>,
}

impl<'a, T: Entity> Repo<'a, T> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    pub fn list(&self) -> anyhow::Result<Vec<T>> {
        let Some(bytes) = self.store.get(T::KEY)? else {
            return Ok(Vec::new());
        };
        Ok(decode_collection::<T>(&bytes))
    }

    pub fn find_by<F>(&self, pred: F) -> anyhow::Result<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list()?.into_iter().filter(|e| pred(e)).collect())
    }

    pub fn find_one<F>(&self, pred: F) -> anyhow::Result<Option<T>>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list()?.into_iter().find(|e| pred(e)))
    }

    pub fn get(&self, id: &str) -> anyhow::Result<Option<T>> {
        self.find_one(|e| e.id() == id)
    }

    /// Replace the entity with the same ID in place, or append it.
    pub fn upsert(&self, entity: T) -> anyhow::Result<()> {
        let bytes = self.staged_upsert(entity)?;
        self.store.set(T::KEY, &bytes)
    }

    /// The encoded collection `upsert` would write, without writing it.
    /// Callers batch several of these through `KvStore::set_many`.
    pub fn staged_upsert(&self, entity: T) -> anyhow::Result<Vec<u8>> {
        let mut all = self.list()?;
        match all.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => all.push(entity),
        }
        encode_collection(&all)
    }

    /// Returns whether an entity was removed.
    pub fn remove(&self, id: &str) -> anyhow::Result<bool> {
        let mut all = self.list()?;
        let before = all.len();
        all.retain(|e| e.id() != id);
        if all.len() == before {
            return Ok(false);
        }
        self.replace_all(&all)?;
        Ok(true)
    }

    pub fn replace_all(&self, all: &[T]) -> anyhow::Result<()> {
        let bytes = encode_collection(all)?;
        self.store.set(T::KEY, &bytes)
    }

    /// Write `defaults` iff the key is absent. Returns whether it seeded.
    pub fn seed(&self, defaults: &[T]) -> anyhow::Result<bool> {
        if self.store.get(T::KEY)?.is_some() {
            return Ok(false);
        }
        self.replace_all(defaults)?;
        Ok(true)
    }
}

fn encode_collection<T: Entity>(all: &[T]) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(all).with_context(|| format!("failed to encode {}", T::KEY))
}

fn decode_collection<T: Entity>(bytes: &[u8]) -> Vec<T> {
    let raw: Vec<serde_json::Value> = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!(key = T::KEY, error = %e, "stored collection is unreadable; treating as empty");
            return Vec::new();
        }
    };
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, v)| match serde_json::from_value::<T>(v) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(key = T::KEY, index = idx, error = %e, "skipping invalid stored element");
                None
            }
        })
        .collect()
}
