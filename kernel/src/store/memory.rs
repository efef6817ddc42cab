// In-Memory Metadata Store
//
// Reference implementation of the store contract, used by tests and the
// dry-run CLI. A single mutex is enough: every operation is a short
// critical section over a BTreeMap, and the map's ordering gives
// `list` its sorted output for free.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{MetaError, Result};
use crate::store::MetadataStore;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<String, Arc<[u8]>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Test helper.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl MetadataStore for InMemoryStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut objects = self.objects.lock();
        if objects.contains_key(key) {
            return Err(MetaError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), Arc::from(bytes));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .get(key)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| MetaError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.lock();
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
