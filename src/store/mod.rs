//! Key/value storage used as the peer's world state.

use crate::error::Result;

mod bufstore;
mod mapstore;

pub use bufstore::{BufStore, Map};
pub use mapstore::MapStore;

/// Read access to a key/value store.
pub trait Read {
    /// Gets the value stored under `key`, or `None` if the key is not set.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// Write access to a key/value store.
pub trait Write {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

pub trait Store: Read + Write {}

impl<S: Read + Write> Store for S {}

/// A store which buffers writes and can apply them to an underlying store.
pub trait Flush {
    fn flush(&mut self) -> Result<()>;
}

impl<R: Read + ?Sized> Read for &R {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }
}

impl<R: Read + ?Sized> Read for &mut R {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }
}

impl<W: Write + ?Sized> Write for &mut W {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}
