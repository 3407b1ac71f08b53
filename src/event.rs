//! Chaincode events and their delivery to listeners once committed.

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::ledger::Block;

/// An event set by a chaincode during a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChaincodeEvent {
    pub chaincode_id: String,
    pub tx_id: String,
    pub event_name: String,
    #[serde(serialize_with = "crate::shim::as_lossy_str")]
    pub payload: Vec<u8>,
}

/// A chaincode event as delivered to listeners, along with the block which
/// committed it. The committing transaction is `event.tx_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEvent {
    pub block_number: u64,
    #[serde(flatten)]
    pub event: ChaincodeEvent,
}

/// Notification that a transaction was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxEvent {
    pub tx_id: String,
    pub block_number: u64,
    /// Status of the chaincode response which was committed.
    pub status: i32,
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

type Listener = Box<dyn FnMut(&BlockEvent)>;
type TxListener = Box<dyn FnMut(&TxEvent)>;
type BlockListener = Box<dyn FnMut(&Block)>;

struct Registration {
    handle: ListenerHandle,
    chaincode_id: String,
    pattern: Regex,
    once: bool,
    listener: Listener,
}

impl Registration {
    fn matches(&self, event: &ChaincodeEvent) -> bool {
        self.chaincode_id == event.chaincode_id && self.pattern.is_match(&event.event_name)
    }
}

struct TxRegistration {
    handle: ListenerHandle,
    tx_id: String,
    listener: TxListener,
}

struct BlockRegistration {
    handle: ListenerHandle,
    listener: BlockListener,
}

/// Fans committed blocks, transactions and chaincode events out to
/// registered listeners.
#[derive(Default)]
pub struct EventHub {
    registrations: Vec<Registration>,
    tx_registrations: Vec<TxRegistration>,
    block_registrations: Vec<BlockRegistration>,
    next_handle: u64,
}

impl EventHub {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `listener` for events from `chaincode_id` whose name matches
    /// the regular expression `event_name`.
    pub fn register_chaincode_event<F>(
        &mut self,
        chaincode_id: &str,
        event_name: &str,
        listener: F,
    ) -> Result<ListenerHandle>
    where
        F: FnMut(&BlockEvent) + 'static,
    {
        self.register(chaincode_id, event_name, false, Box::new(listener))
    }

    /// Like `register_chaincode_event`, but the listener is removed after the
    /// first event delivered to it.
    pub fn register_once<F>(
        &mut self,
        chaincode_id: &str,
        event_name: &str,
        listener: F,
    ) -> Result<ListenerHandle>
    where
        F: FnMut(&BlockEvent) + 'static,
    {
        self.register(chaincode_id, event_name, true, Box::new(listener))
    }

    fn register(
        &mut self,
        chaincode_id: &str,
        event_name: &str,
        once: bool,
        listener: Listener,
    ) -> Result<ListenerHandle> {
        let pattern = Regex::new(event_name)?;
        let handle = self.next_handle();
        self.registrations.push(Registration {
            handle,
            chaincode_id: chaincode_id.to_string(),
            pattern,
            once,
            listener,
        });
        debug!("registered listener {:?} for {}/{}", handle, chaincode_id, event_name);
        Ok(handle)
    }

    /// Registers `listener` for the commit of transaction `tx_id`. The
    /// listener fires at most once and is then removed.
    pub fn register_tx_event<F>(&mut self, tx_id: &str, listener: F) -> ListenerHandle
    where
        F: FnMut(&TxEvent) + 'static,
    {
        let handle = self.next_handle();
        self.tx_registrations.push(TxRegistration {
            handle,
            tx_id: tx_id.to_string(),
            listener: Box::new(listener),
        });
        debug!("registered listener {:?} for tx {}", handle, tx_id);
        handle
    }

    /// Registers `listener` for every committed block.
    pub fn register_block_event<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(&Block) + 'static,
    {
        let handle = self.next_handle();
        self.block_registrations.push(BlockRegistration {
            handle,
            listener: Box::new(listener),
        });
        debug!("registered block listener {:?}", handle);
        handle
    }

    fn next_handle(&mut self) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Removes a listener of any kind. Returns false if it was not
    /// registered.
    pub fn unregister(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listener_count();
        self.registrations.retain(|reg| reg.handle != handle);
        self.tx_registrations.retain(|reg| reg.handle != handle);
        self.block_registrations.retain(|reg| reg.handle != handle);
        before != self.listener_count()
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.len() + self.tx_registrations.len() + self.block_registrations.len()
    }

    /// Delivers a committed block: first to block listeners, then to the
    /// listeners of each of its transactions, then its chaincode events to
    /// every matching chaincode listener, each in registration order.
    pub fn publish(&mut self, block: &Block) {
        for reg in self.block_registrations.iter_mut() {
            (reg.listener)(block);
        }

        for tx in &block.transactions {
            let tx_event = TxEvent {
                tx_id: tx.tx_id.clone(),
                block_number: block.number,
                status: tx.response.status,
            };
            self.tx_registrations.retain_mut(|reg| {
                if reg.tx_id != tx_event.tx_id {
                    return true;
                }
                (reg.listener)(&tx_event);
                false
            });
        }

        for event in block.events() {
            let block_event = BlockEvent {
                block_number: block.number,
                event: event.clone(),
            };
            self.registrations.retain_mut(|reg| {
                if !reg.matches(event) {
                    return true;
                }
                (reg.listener)(&block_event);
                !reg.once
            });
        }
    }
}
