//! Generic load-or-seed record store.
//!
//! A [`RecordStore`] owns the in-memory collection of one record kind for the
//! lifetime of a session and mirrors it to a [`BlobStore`]. Every mutation
//! rewrites the whole collection.
//!
//! # Loading
//!
//! | stored state                   | `Reseed`            | `Migrate`                 |
//! |--------------------------------|---------------------|---------------------------|
//! | no blob                        | seed, persist       | seed, persist             |
//! | version differs                | seed, persist       | normalize stored, persist |
//! | blob is not a JSON array       | seed, persist       | seed, persist             |
//! | version matches                | normalize stored    | normalize stored          |
//!
//! Records the normalizer rejects, and records repeating the unique key of an
//! earlier one, are dropped with a warning.

use std::collections::HashSet;
use std::marker::PhantomData;

use olivo_market_core::normalize::{NormalizeContext, ParseResult, normalize_batch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::storage::SharedBlobStore;

/// What to do with persisted records written under another schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Discard them and start over from the seed.
    Reseed,
    /// Keep them, running each through the normalizer.
    Migrate,
}

/// Static description of one record kind.
pub trait RecordKind {
    type Record: Clone + Serialize + DeserializeOwned;

    /// Human-readable name used in logs.
    const LABEL: &'static str;
    const STORAGE_KEY: &'static str;
    const VERSION_KEY: &'static str;
    const SCHEMA_VERSION: &'static str;
    const POLICY: VersionPolicy;

    /// Built-in default collection.
    fn seed(ctx: &NormalizeContext) -> Vec<Self::Record>;

    fn normalize(raw: &Value, position: usize, ctx: &NormalizeContext) -> ParseResult<Self::Record>;

    fn id(record: &Self::Record) -> &str;

    /// Secondary key that must be unique across the collection, if any.
    /// Stored records repeating one are dropped on load, keeping the first.
    fn unique_key(_record: &Self::Record) -> Option<&str> {
        None
    }
}

/// In-memory collection of `K::Record`, persisted after every mutation.
pub struct RecordStore<K: RecordKind> {
    blobs: SharedBlobStore,
    records: Vec<K::Record>,
    _kind: PhantomData<K>,
}

impl<K: RecordKind> std::fmt::Debug for RecordStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("kind", &K::LABEL)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<K: RecordKind> RecordStore<K> {
    /// Load the collection from `blobs`, seeding or migrating as needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store cannot be read or the
    /// seed cannot be written. A corrupt blob is not an error.
    pub fn load(blobs: SharedBlobStore, ctx: &NormalizeContext) -> Result<Self, StoreError> {
        let stored_version = blobs.get(K::VERSION_KEY)?;
        let stored = blobs.get(K::STORAGE_KEY)?;
        let version_matches = stored_version.as_deref() == Some(K::SCHEMA_VERSION);

        let mut store = Self {
            blobs,
            records: Vec::new(),
            _kind: PhantomData,
        };

        let Some(raw) = stored else {
            info!(kind = K::LABEL, "No stored records, seeding defaults");
            store.reseed(ctx)?;
            return Ok(store);
        };

        if !version_matches && K::POLICY == VersionPolicy::Reseed {
            info!(
                kind = K::LABEL,
                stored_version = stored_version.as_deref().unwrap_or("none"),
                schema_version = K::SCHEMA_VERSION,
                "Schema version changed, reseeding"
            );
            store.reseed(ctx)?;
            return Ok(store);
        }

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                warn!(kind = K::LABEL, "Stored records are corrupt, discarding");
                store.reseed(ctx)?;
                return Ok(store);
            }
        };

        let batch = normalize_batch(&entries, |raw, position| K::normalize(raw, position, ctx));
        for (position, reason) in &batch.rejected {
            warn!(kind = K::LABEL, position, reason = %reason, "Dropping invalid stored record");
        }
        let mut records = batch.records;
        let duplicates = drop_duplicate_keys::<K>(&mut records);
        let dirty = !batch.rejected.is_empty() || duplicates > 0 || !version_matches;
        store.records = records;
        debug!(kind = K::LABEL, count = store.records.len(), "Loaded records");

        if dirty {
            store.persist()?;
        }
        Ok(store)
    }

    fn reseed(&mut self, ctx: &NormalizeContext) -> Result<(), StoreError> {
        self.records = K::seed(ctx);
        self.persist()
    }

    /// Write the whole collection and the schema version.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding or writing fails.
    pub fn persist(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.records)?;
        self.blobs.set(K::STORAGE_KEY, &encoded)?;
        self.blobs.set(K::VERSION_KEY, K::SCHEMA_VERSION)?;
        Ok(())
    }

    #[must_use]
    pub fn records(&self) -> &[K::Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&K::Record> {
        self.records.iter().find(|r| K::id(r) == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn blobs(&self) -> &SharedBlobStore {
        &self.blobs
    }

    /// Apply `f` to the record with `id` and persist.
    ///
    /// Returns `Ok(false)` without persisting when no record matches.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from `f` or from persisting.
    pub fn modify<F>(&mut self, id: &str, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut K::Record) -> Result<(), StoreError>,
    {
        let Some(record) = self.records.iter_mut().find(|r| K::id(r) == id) else {
            return Ok(false);
        };
        f(record)?;
        self.persist()?;
        Ok(true)
    }

    /// Apply `f` to every record whose id is in `ids`, persisting once.
    ///
    /// Returns how many records were touched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn modify_each<F>(&mut self, ids: &[&str], mut f: F) -> Result<usize, StoreError>
    where
        F: FnMut(&mut K::Record),
    {
        let mut touched = 0;
        for record in &mut self.records {
            if ids.contains(&K::id(record)) {
                f(record);
                touched += 1;
            }
        }
        if touched > 0 {
            self.persist()?;
        }
        Ok(touched)
    }

    /// Append a record and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn push(&mut self, record: K::Record) -> Result<(), StoreError> {
        self.records.push(record);
        self.persist()
    }

    /// Insert a record at the front and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn push_front(&mut self, record: K::Record) -> Result<(), StoreError> {
        self.records.insert(0, record);
        self.persist()
    }

    /// Remove the record with `id` and persist. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| K::id(r) != id);
        if self.records.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Replace the whole collection and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn replace_all(&mut self, records: Vec<K::Record>) -> Result<(), StoreError> {
        self.records = records;
        self.persist()
    }

    /// Keep only the records for which `keep` returns true, truncate to
    /// `limit`, and persist. Returns how many records were dropped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from persisting.
    pub fn retain_limited<F>(&mut self, keep: F, limit: usize) -> Result<usize, StoreError>
    where
        F: FnMut(&K::Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        self.records.truncate(limit);
        self.persist()?;
        Ok(before - self.records.len())
    }
}

/// Remove records whose [`RecordKind::unique_key`] repeats an earlier one.
/// Returns how many were removed.
fn drop_duplicate_keys<K: RecordKind>(records: &mut Vec<K::Record>) -> usize {
    let mut seen = HashSet::new();
    let before = records.len();
    records.retain(|record| match K::unique_key(record) {
        Some(key) if !seen.insert(key.to_owned()) => {
            warn!(kind = K::LABEL, id = K::id(record), key, "Dropping stored record with duplicate key");
            false
        }
        _ => true,
    });
    before - records.len()
}
