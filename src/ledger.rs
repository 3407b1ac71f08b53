//! The chain of committed blocks kept by the peer.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::event::ChaincodeEvent;
use crate::shim::Response;

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub tx_id: String,
    pub args: Vec<String>,
    pub response: Response,
    pub event: Option<ChaincodeEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub number: u64,
    /// Hex SHA-256 of the previous block, empty for the first block.
    pub previous_hash: String,
    pub hash: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn events(&self) -> impl Iterator<Item = &ChaincodeEvent> {
        self.transactions.iter().filter_map(|tx| tx.event.as_ref())
    }
}

/// Summary of the chain, as reported by `Peer::info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub height: u64,
    pub current_block_hash: String,
    pub previous_block_hash: String,
}

#[derive(Debug, Default)]
pub struct Ledger {
    blocks: Vec<Block>,
}

impl Ledger {
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of blocks in the chain.
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Appends a block holding `transactions`, chained onto the current tip.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> &Block {
        let number = self.height();
        let previous_hash = self
            .blocks
            .last()
            .map(|block| block.hash.clone())
            .unwrap_or_default();
        let hash = block_hash(number, &previous_hash, &transactions);
        self.blocks.push(Block {
            number,
            previous_hash,
            hash,
            transactions,
        });
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        usize::try_from(number).ok().and_then(|n| self.blocks.get(n))
    }

    pub fn block_by_tx_id(&self, tx_id: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|block| block.transactions.iter().any(|tx| tx.tx_id == tx_id))
    }

    pub fn transaction(&self, tx_id: &str) -> Option<&Transaction> {
        self.blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .find(|tx| tx.tx_id == tx_id)
    }

    pub fn info(&self) -> ChainInfo {
        let hash_at = |back: usize| {
            self.blocks
                .len()
                .checked_sub(back)
                .and_then(|n| self.blocks.get(n))
                .map(|block| block.hash.clone())
                .unwrap_or_default()
        };
        ChainInfo {
            height: self.height(),
            current_block_hash: hash_at(1),
            previous_block_hash: hash_at(2),
        }
    }
}

fn block_hash(number: u64, previous_hash: &str, transactions: &[Transaction]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(number.to_be_bytes());
    hasher.update(previous_hash.as_bytes());
    for tx in transactions {
        hasher.update((tx.tx_id.len() as u64).to_be_bytes());
        hasher.update(tx.tx_id.as_bytes());
    }
    hex::encode(hasher.finalize())
}
