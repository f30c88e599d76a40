//! Read access to current database state for transforms that need it.

use crate::error::ReaderError;
use crate::model::key::Key;
use crate::model::policy::{BatchPolicy, Policy};
use crate::model::record::Record;

pub mod memory;

/// A key plus the bins to fetch for it in a batch read. `record` is filled
/// in by the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRead {
    pub key: Key,
    /// `None` reads all bins.
    pub bin_names: Option<Vec<String>>,
    pub record: Option<Record>,
}

impl BatchRead {
    pub fn new(key: Key, bin_names: Option<Vec<String>>) -> Self {
        Self {
            key,
            bin_names,
            record: None,
        }
    }
}

/// Provided by the host and injected into transforms at construction.
///
/// Policies are optional; `None` means the host defaults. Batch results are
/// positionally aligned with the requested keys and hold `None` for missing
/// records. A batch either succeeds as a whole or fails as a whole.
pub trait AerospikeReader: Send + Sync {
    /// Reads the whole record. A missing record is `Ok(None)`; any other
    /// failure is an error.
    fn get(&self, policy: Option<&Policy>, key: &Key) -> Result<Option<Record>, ReaderError>;

    fn get_bins(
        &self,
        policy: Option<&Policy>,
        key: &Key,
        bin_names: &[&str],
    ) -> Result<Option<Record>, ReaderError>;

    fn get_batch(
        &self,
        policy: Option<&BatchPolicy>,
        keys: &[Key],
    ) -> Result<Vec<Option<Record>>, ReaderError>;

    fn get_batch_bins(
        &self,
        policy: Option<&BatchPolicy>,
        keys: &[Key],
        bin_names: &[&str],
    ) -> Result<Vec<Option<Record>>, ReaderError>;

    /// Batch read with a bin selection per key. Results are written back
    /// into `records`.
    fn get_batch_reads(
        &self,
        policy: Option<&BatchPolicy>,
        records: &mut [BatchRead],
    ) -> Result<(), ReaderError>;

    /// Like [`get`](Self::get), but also folds a not-found error into
    /// `Ok(None)` for readers that report missing records as errors.
    fn find(&self, policy: Option<&Policy>, key: &Key) -> Result<Option<Record>, ReaderError> {
        match self.get(policy, key) {
            Ok(record) => Ok(record),
            Err(err) if err.is_not_found() => {
                log::debug!("Record not found: [{key}]", key = key);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
