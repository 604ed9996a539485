//! Request record storage.

use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{RequestError, RequestRecord, RequestStatus};

/// Read/update access to request records.
pub trait RequestStore: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    fn insert(&self, record: RequestRecord) -> Result<(), RequestError>;

    /// Get a record by ID.
    fn get(&self, id: &str) -> Result<Option<RequestRecord>, RequestError>;

    /// Transition a record to a new status.
    fn update_status(&self, id: &str, status: RequestStatus) -> Result<RequestRecord, RequestError>;

    /// All records, in no particular order.
    fn list(&self) -> Result<Vec<RequestRecord>, RequestError>;
}

/// In-process request store.
#[derive(Debug, Default)]
pub struct MemoryRequestStore {
    records: Mutex<HashMap<String, RequestRecord>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RequestRecord>>, RequestError> {
        self.records
            .lock()
            .map_err(|e| RequestError::Store(format!("lock poisoned: {}", e)))
    }
}

impl RequestStore for MemoryRequestStore {
    fn insert(&self, record: RequestRecord) -> Result<(), RequestError> {
        let mut records = self.lock()?;
        if records.contains_key(&record.id) {
            return Err(RequestError::Store(format!(
                "request already exists: {}",
                record.id
            )));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<RequestRecord>, RequestError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn update_status(&self, id: &str, status: RequestStatus) -> Result<RequestRecord, RequestError> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| RequestError::NotFound(id.to_string()))?;
        record.transition(status)?;
        Ok(record.clone())
    }

    fn list(&self) -> Result<Vec<RequestRecord>, RequestError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
