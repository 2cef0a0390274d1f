//! Core Store implementation

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::record::{Filter, IndexValue, Record};

/// One stored record: its JSON body plus the index captured at write time
#[derive(Debug, Clone)]
struct Entry {
    body: Value,
    index: HashMap<String, IndexValue>,
}

impl Entry {
    fn from_record<T: Record + Serialize>(record: &T) -> Result<Self> {
        Ok(Self {
            body: serde_json::to_value(record)?,
            index: record.indexed_fields(),
        })
    }
}

/// In-memory record store, one ordered map per collection.
///
/// The store is not internally synchronized; callers that share it across
/// tasks put it behind a single owner (see `batchd::state::StateManager`).
#[derive(Debug, Default)]
pub struct Store {
    collections: HashMap<&'static str, BTreeMap<String, Entry>>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        debug!("Store::new: called");
        Self::default()
    }

    /// Insert a new record, failing if the id is already taken
    pub fn create<T: Record + Serialize>(&mut self, record: T) -> Result<String> {
        let collection = T::collection_name();
        let id = record.id().to_string();
        debug!(collection, %id, "Store::create: called");

        let entry = Entry::from_record(&record)?;
        let records = self.collections.entry(collection).or_default();
        if records.contains_key(&id) {
            return Err(StoreError::AlreadyExists { collection, id });
        }
        records.insert(id.clone(), entry);
        Ok(id)
    }

    /// Fetch a record by id
    pub fn get<T: Record + DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        debug!(collection = T::collection_name(), %id, "Store::get: called");
        self.collections
            .get(T::collection_name())
            .and_then(|records| records.get(id))
            .map(|entry| serde_json::from_value(entry.body.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Replace an existing record
    pub fn update<T: Record + Serialize>(&mut self, record: T) -> Result<()> {
        let collection = T::collection_name();
        debug!(collection, id = %record.id(), "Store::update: called");

        let entry = Entry::from_record(&record)?;
        let slot = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(record.id()))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: record.id().to_string(),
            })?;
        *slot = entry;
        Ok(())
    }

    /// Read-modify-write a single record.
    ///
    /// `f` returns `false` to decline the change, in which case nothing is
    /// written and `Ok(None)` comes back. Otherwise the modified record is
    /// stored and returned.
    pub fn modify<T, F>(&mut self, id: &str, f: F) -> Result<Option<T>>
    where
        T: Record + Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> bool,
    {
        let collection = T::collection_name();
        debug!(collection, %id, "Store::modify: called");

        let mut record: T = self.get(id)?.ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_string(),
        })?;

        if !f(&mut record) {
            debug!(collection, %id, "Store::modify: change declined");
            return Ok(None);
        }

        let entry = Entry::from_record(&record)?;
        if let Some(slot) = self.collections.get_mut(collection).and_then(|r| r.get_mut(id)) {
            *slot = entry;
        }
        Ok(Some(record))
    }

    /// List all records of a type matching every filter, ordered by id
    pub fn list<T: Record + DeserializeOwned>(&self, filters: &[Filter]) -> Result<Vec<T>> {
        debug!(collection = T::collection_name(), filters = filters.len(), "Store::list: called");
        let Some(records) = self.collections.get(T::collection_name()) else {
            return Ok(Vec::new());
        };

        records
            .values()
            .filter(|entry| filters.iter().all(|f| f.matches(&entry.index)))
            .map(|entry| serde_json::from_value(entry.body.clone()).map_err(StoreError::from))
            .collect()
    }

    /// Count records of a type matching every filter
    pub fn count<T: Record>(&self, filters: &[Filter]) -> usize {
        self.collections
            .get(T::collection_name())
            .map(|records| {
                records
                    .values()
                    .filter(|entry| filters.iter().all(|f| f.matches(&entry.index)))
                    .count()
            })
            .unwrap_or(0)
    }
}
