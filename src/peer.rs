//! An in-process peer which hosts a single chaincode.
//!
//! Every successful transaction is committed in a block of its own. Writes
//! made by a chaincode are simulated against a buffer and only flushed to the
//! world state on commit, at which point the block is appended to the ledger
//! and published to the `EventHub`.

use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::PeerConfig;
use crate::error::{Error, Result};
use crate::event::{ChaincodeEvent, EventHub};
use crate::ledger::{Block, ChainInfo, Ledger, Transaction};
use crate::shim::{Chaincode, Response, TxStub};
use crate::store::{BufStore, Flush, Map, MapStore, Read, Store, Write};

/// The outcome of a transaction submitted to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxResult {
    pub tx_id: String,
    /// The block which committed the transaction, or `None` if it was
    /// rejected.
    pub block_number: Option<u64>,
    pub response: Response,
    pub event: Option<ChaincodeEvent>,
}

impl TxResult {
    pub fn is_committed(&self) -> bool {
        self.block_number.is_some()
    }
}

struct Simulation {
    tx_id: String,
    args: Vec<String>,
    response: Response,
    writes: Map,
    event: Option<(String, Vec<u8>)>,
}

pub struct Peer<C, S = MapStore> {
    config: PeerConfig,
    chaincode: C,
    store: S,
    events: EventHub,
    ledger: Ledger,
    nonce: u64,
    instantiated: bool,
}

impl<C: Chaincode, S: Store + Default> Peer<C, S> {
    /// Constructs a peer with an empty world state.
    pub fn new(config: PeerConfig, chaincode: C) -> Self {
        Self::with_store(config, chaincode, S::default())
    }
}

impl<C: Chaincode, S: Store> Peer<C, S> {
    pub fn with_store(config: PeerConfig, chaincode: C, store: S) -> Self {
        Peer {
            config,
            chaincode,
            store,
            events: EventHub::new(),
            ledger: Ledger::new(),
            nonce: 0,
            instantiated: false,
        }
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Number of blocks committed so far. Block numbers start at 0.
    pub fn height(&self) -> u64 {
        self.ledger.height()
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        self.ledger.block(number)
    }

    /// The block which committed `tx_id`. Rejected transactions and queries
    /// are never found.
    pub fn block_by_tx_id(&self, tx_id: &str) -> Option<&Block> {
        self.ledger.block_by_tx_id(tx_id)
    }

    pub fn transaction(&self, tx_id: &str) -> Option<&Transaction> {
        self.ledger.transaction(tx_id)
    }

    pub fn info(&self) -> ChainInfo {
        self.ledger.info()
    }

    /// The committed world state.
    pub fn state(&self) -> &S {
        &self.store
    }

    pub fn events(&mut self) -> &mut EventHub {
        &mut self.events
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    /// Runs the chaincode's `init` and commits its writes if it succeeds.
    pub fn instantiate<I, A>(&mut self, args: I) -> Result<TxResult>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        if self.instantiated {
            return Err(Error::AlreadyInstantiated);
        }
        let sim = self.simulate(collect_args(args), true);
        let res = self.settle(sim)?;
        if res.is_committed() {
            self.instantiated = true;
            info!(
                "{}: instantiated {} on {}",
                self.config.peer_id, self.config.chaincode_id, self.config.channel_id
            );
        }
        Ok(res)
    }

    /// Submits a transaction. A successful response commits the
    /// transaction's writes and publishes its event; an error response leaves
    /// the world state untouched.
    ///
    /// If the store fails while the writes are flushed, the keys already
    /// written are restored, no block is created and the store's error is
    /// returned.
    pub fn invoke<I, A>(&mut self, args: I) -> Result<TxResult>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.ensure_instantiated()?;
        let sim = self.simulate(collect_args(args), false);
        self.settle(sim)
    }

    /// Evaluates a transaction without committing it. Writes and events are
    /// discarded regardless of the response.
    pub fn query<I, A>(&mut self, args: I) -> Result<Response>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.ensure_instantiated()?;
        let sim = self.simulate(collect_args(args), false);
        debug!(
            "{}: query {} discarded {} writes",
            self.config.peer_id,
            sim.tx_id,
            sim.writes.len()
        );
        Ok(sim.response)
    }

    fn ensure_instantiated(&self) -> Result<()> {
        if self.instantiated {
            Ok(())
        } else {
            Err(Error::NotInstantiated)
        }
    }

    fn simulate(&mut self, args: Vec<String>, init: bool) -> Simulation {
        let tx_id = self.next_tx_id(&args);
        let mut stub = TxStub::new(
            &self.store,
            self.config.channel_id.clone(),
            tx_id.clone(),
            args.clone(),
        );
        let response = if init {
            self.chaincode.init(&mut stub)
        } else {
            self.chaincode.invoke(&mut stub)
        };
        let (writes, event) = stub.into_parts();
        Simulation {
            tx_id,
            args,
            response,
            writes,
            event,
        }
    }

    fn settle(&mut self, sim: Simulation) -> Result<TxResult> {
        let Simulation {
            tx_id,
            args,
            response,
            writes,
            event,
        } = sim;

        if !response.is_ok() {
            warn!(
                "{}: rejected tx {}: {} ({})",
                self.config.peer_id, tx_id, response.message, response.status
            );
            return Ok(TxResult {
                tx_id,
                block_number: None,
                response,
                event: None,
            });
        }

        self.apply(writes)?;

        let event = event.map(|(event_name, payload)| ChaincodeEvent {
            chaincode_id: self.config.chaincode_id.clone(),
            tx_id: tx_id.clone(),
            event_name,
            payload,
        });
        let block = self.ledger.append(vec![Transaction {
            tx_id: tx_id.clone(),
            args,
            response: response.clone(),
            event: event.clone(),
        }]);
        let block_number = block.number;
        info!(
            "{}: committed block {} with tx {}",
            self.config.peer_id, block_number, tx_id
        );
        self.events.publish(block);

        Ok(TxResult {
            tx_id,
            block_number: Some(block_number),
            response,
            event,
        })
    }

    /// Flushes a write set to the world state. On failure, every key of the
    /// write set is put back to the value it had before.
    fn apply(&mut self, writes: Map) -> Result<()> {
        let mut previous = Map::new();
        for key in writes.keys() {
            previous.insert(key.clone(), self.store.get(key)?);
        }

        let err = match BufStore::wrap_with_map(&mut self.store, writes).flush() {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        warn!("{}: flush failed, restoring {} keys", self.config.peer_id, previous.len());
        for (key, value) in previous {
            let restored = match value {
                Some(value) => self.store.put(key, value),
                None => self.store.delete(&key),
            };
            if let Err(restore_err) = restored {
                warn!("{}: failed to restore key: {}", self.config.peer_id, restore_err);
            }
        }
        Err(err)
    }

    /// Hashes the channel, a per-peer nonce and the arguments into a
    /// transaction id.
    fn next_tx_id(&mut self, args: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.channel_id.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        for arg in args {
            hasher.update((arg.len() as u64).to_be_bytes());
            hasher.update(arg.as_bytes());
        }
        self.nonce += 1;
        hex::encode(hasher.finalize())
    }
}

fn collect_args<I, A>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = A>,
    A: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}
