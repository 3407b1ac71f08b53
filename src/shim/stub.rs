use log::debug;

use super::ChaincodeStub;
use crate::error::{Error, Result};
use crate::store::{BufStore, Map, Read, Write};

/// A `ChaincodeStub` for a single transaction simulation.
///
/// Reads go to the peer's world state, writes are buffered in a `BufStore` and
/// only reach the world state if the peer decides to commit the resulting
/// write set.
pub struct TxStub<'a, S> {
    args: Vec<String>,
    tx_id: String,
    channel_id: String,
    store: BufStore<&'a S>,
    event: Option<(String, Vec<u8>)>,
}

impl<'a, S: Read> TxStub<'a, S> {
    pub fn new(store: &'a S, channel_id: String, tx_id: String, args: Vec<String>) -> Self {
        TxStub {
            args,
            tx_id,
            channel_id,
            store: BufStore::wrap(store),
            event: None,
        }
    }

    /// Consumes the stub, returning the buffered write set and the event set
    /// during the transaction, if any.
    pub fn into_parts(self) -> (Map, Option<(String, Vec<u8>)>) {
        (self.store.into_map(), self.event)
    }
}

impl<'a, S: Read> ChaincodeStub for TxStub<'a, S> {
    fn args(&self) -> &[String] {
        &self.args
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key.as_bytes())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Stub("key must not be an empty string".into()));
        }
        self.store.put(key.as_bytes().to_vec(), value)
    }

    fn del_state(&mut self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Stub("key must not be an empty string".into()));
        }
        self.store.delete(key.as_bytes())
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::Stub("event name can not be empty string".into()));
        }
        if let Some((previous, _)) = &self.event {
            debug!("tx {}: replacing event {} with {}", self.tx_id, previous, name);
        }
        self.event = Some((name.to_string(), payload));
        Ok(())
    }
}
