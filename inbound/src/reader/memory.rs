use crate::error::ReaderError;
use crate::model::key::Key;
use crate::model::policy::{BatchPolicy, Policy};
use crate::model::record::Record;
use crate::model::result_code::ResultCode;
use crate::reader::{AerospikeReader, BatchRead};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader over records held in process memory.
///
/// Stands in for the host's database client in tests and in local replay.
/// Can be told to fail every read with a given result code, and to report a
/// missing single record as `KEY_NOT_FOUND_ERROR` instead of `None`.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Key, Record>>,
    failure: RwLock<Option<ResultCode>>,
    missing_as_error: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-key reads of a missing record return `KEY_NOT_FOUND_ERROR`.
    pub fn with_missing_as_error(mut self) -> Self {
        self.missing_as_error = true;
        self
    }

    /// Fails every subsequent read with `code` until cleared with `None`.
    pub fn set_failure(&self, code: Option<ResultCode>) {
        *self.failure.write().unwrap_or_else(|e| e.into_inner()) = code;
    }

    pub fn put_record(&self, key: Key, record: Record) {
        self.write().insert(key, record);
    }

    pub fn remove(&self, key: &Key) -> Option<Record> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Runs `f` on a copy of the record slot for `key` under the write lock,
    /// then stores the copy. Setting the slot to `None` removes the record.
    /// If `f` panics the stored record is left as it was.
    pub fn update<R>(&self, key: &Key, f: impl FnOnce(&mut Option<Record>) -> R) -> R {
        let mut records = self.write();
        let mut slot = records.get(key).cloned();
        let result = f(&mut slot);
        match slot {
            Some(record) => {
                records.insert(key.clone(), record);
            }
            None => {
                records.remove(key);
            }
        }
        result
    }

    /// Copy of every stored record.
    pub fn snapshot(&self) -> Vec<(Key, Record)> {
        self.read()
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Key, Record>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Key, Record>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self, what: &str) -> Result<(), ReaderError> {
        match *self.failure.read().unwrap_or_else(|e| e.into_inner()) {
            None => Ok(()),
            Some(code) => Err(ReaderError::new(code, format!("{} failed", what))),
        }
    }

    fn lookup(&self, key: &Key, bin_names: &[&str]) -> Option<Record> {
        self.read()
            .get(key)
            .cloned()
            .map(|record| record.select(bin_names))
    }

    fn single(&self, key: &Key, bin_names: &[&str]) -> Result<Option<Record>, ReaderError> {
        self.check_failure("read")?;
        match self.lookup(key, bin_names) {
            Some(record) => Ok(Some(record)),
            None if self.missing_as_error => {
                Err(ReaderError::not_found(format!("record [{}] not found", key)))
            }
            None => Ok(None),
        }
    }

    fn batch(&self, keys: &[Key], bin_names: &[&str]) -> Result<Vec<Option<Record>>, ReaderError> {
        self.check_failure("batch read")?;
        Ok(keys.iter().map(|key| self.lookup(key, bin_names)).collect())
    }
}

impl AerospikeReader for MemoryStore {
    fn get(&self, _policy: Option<&Policy>, key: &Key) -> Result<Option<Record>, ReaderError> {
        self.single(key, &[])
    }

    fn get_bins(
        &self,
        _policy: Option<&Policy>,
        key: &Key,
        bin_names: &[&str],
    ) -> Result<Option<Record>, ReaderError> {
        self.single(key, bin_names)
    }

    fn get_batch(
        &self,
        _policy: Option<&BatchPolicy>,
        keys: &[Key],
    ) -> Result<Vec<Option<Record>>, ReaderError> {
        self.batch(keys, &[])
    }

    fn get_batch_bins(
        &self,
        _policy: Option<&BatchPolicy>,
        keys: &[Key],
        bin_names: &[&str],
    ) -> Result<Vec<Option<Record>>, ReaderError> {
        self.batch(keys, bin_names)
    }

    fn get_batch_reads(
        &self,
        _policy: Option<&BatchPolicy>,
        records: &mut [BatchRead],
    ) -> Result<(), ReaderError> {
        self.check_failure("batch read")?;
        for read in records.iter_mut() {
            let names: Vec<&str> = read
                .bin_names
                .iter()
                .flatten()
                .map(|s| s.as_str())
                .collect();
            read.record = self.lookup(&read.key, &names);
        }
        Ok(())
    }
}
