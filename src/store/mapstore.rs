use std::collections::BTreeMap;

use super::*;

/// A simple `Store` implementation which keeps all entries in an in-memory
/// ordered map.
#[derive(Default, Debug, Clone)]
pub struct MapStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl MapStore {
    pub fn new() -> MapStore {
        Default::default()
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.0.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl Read for MapStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.get(key).cloned())
    }
}

impl Write for MapStore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }
}
