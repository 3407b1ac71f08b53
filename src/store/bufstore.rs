use std::collections::BTreeMap;

use super::*;

/// An in-memory map containing values modified by writes to a `BufStore`.
/// `None` marks a deleted key.
pub type Map = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Wraps a `Store` and records mutations in an in-memory map, so that
/// modifications do not affect the underlying `Store` until `flush` is called.
///
/// Dropping a `BufStore` without flushing discards its writes, which is how
/// failed transactions are rolled back.
pub struct BufStore<S> {
    map: Map,
    store: S,
}

impl<S: Read> BufStore<S> {
    /// Constructs a `BufStore` by wrapping the given store.
    ///
    /// Calls to get will first check the `BufStore` map, and if no entry is
    /// found will be passed to the underlying store.
    pub fn wrap(store: S) -> Self {
        BufStore {
            store,
            map: Default::default(),
        }
    }

    /// Creates a `BufStore` by wrapping the given store, using a pre-populated
    /// in-memory buffer of key/value entries.
    pub fn wrap_with_map(store: S, map: Map) -> Self {
        BufStore { store, map }
    }

    /// Consumes the `BufStore` and returns its in-memory buffer of key/value
    /// entries.
    pub fn into_map(self) -> Map {
        self.map
    }

    /// The keys written or deleted so far, in key order.
    pub fn write_set(&self) -> impl Iterator<Item = &[u8]> {
        self.map.keys().map(Vec::as_slice)
    }
}

impl<S: Read> Read for BufStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.map.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.store.get(key),
        }
    }
}

impl<S: Read> Write for BufStore<S> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.map.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.insert(key.to_vec(), None);
        Ok(())
    }
}

impl<S: Store> Flush for BufStore<S> {
    /// Consumes the `BufStore`'s in-memory buffer and writes all of its values
    /// to the underlying store.
    ///
    /// After calling `flush`, the `BufStore` will still be valid and wrap the
    /// underlying store, but its in-memory buffer will be empty.
    fn flush(&mut self) -> Result<()> {
        while let Some((key, value)) = self.map.pop_first() {
            match value {
                Some(value) => self.store.put(key, value)?,
                None => self.store.delete(key.as_slice())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_store_trait() {
        // (this is a compile-time assertion)
        fn assert_store<S: Store>(_: S) {}
        assert_store(BufStore::wrap(MapStore::new()));
    }

    #[test]
    fn reads_through_to_backing() {
        let mut backing = MapStore::new();
        backing.put(b"numEvents".to_vec(), b"3".to_vec()).unwrap();

        let buf = BufStore::wrap(&mut backing);
        assert_eq!(buf.get(b"numEvents").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn buffer_shadows_backing() {
        let mut backing = MapStore::new();
        backing.put(vec![1], vec![1]).unwrap();
        backing.put(vec![2], vec![2]).unwrap();

        let mut buf = BufStore::wrap(&mut backing);
        buf.put(vec![1], vec![10]).unwrap();
        buf.delete(&[2]).unwrap();

        assert_eq!(buf.get(&[1]).unwrap(), Some(vec![10]));
        assert_eq!(buf.get(&[2]).unwrap(), None);
        let written: Vec<_> = buf.write_set().map(<[u8]>::to_vec).collect();
        assert_eq!(written, vec![vec![1], vec![2]]);
    }

    #[test]
    fn drop_discards_writes() {
        let mut backing = MapStore::new();
        {
            let mut buf = BufStore::wrap(&mut backing);
            buf.put(vec![1], vec![1]).unwrap();
        }
        assert_eq!(backing.get(&[1]).unwrap(), None);
    }

    #[test]
    fn flush() {
        let mut backing = MapStore::new();
        backing.put(vec![2], vec![2]).unwrap();

        let mut buf = BufStore::wrap(&mut backing);
        buf.put(vec![1], vec![1]).unwrap();
        buf.delete(&[2]).unwrap();
        buf.flush().unwrap();
        assert!(buf.into_map().is_empty());

        assert_eq!(backing.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(backing.get(&[2]).unwrap(), None);
    }
}
