//! A counter chaincode which emits an event on every invocation, together
//! with the in-process peer used to drive it.

pub mod chaincode;
pub mod config;
mod error;
pub mod event;
pub mod ledger;
pub mod peer;
pub mod shim;
pub mod store;

pub use chaincode::EventSender;
pub use config::PeerConfig;
pub use error::*;
pub use event::{BlockEvent, ChaincodeEvent, EventHub, ListenerHandle, TxEvent};
pub use ledger::{Block, ChainInfo, Transaction};
pub use peer::{Peer, TxResult};
pub use shim::{Chaincode, ChaincodeStub, Response};
