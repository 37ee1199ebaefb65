//! In-memory certificate ledger served by the reference backend.

use tracing::debug;

use crate::model::{compute_block_hash, now_millis, unix_seconds, Block, ChainData, GENESIS_PREVIOUS_HASH};

/// SHA-256 linked chain with a pending list of certificate hashes.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<String>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.create_block(Vec::new(), GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn next_index(&self) -> u64 {
        (self.chain.len() as u64) + 1
    }

    fn create_block(&mut self, certificate_hashes: Vec<String>, previous_hash: String) -> Block {
        let mut block = Block {
            index: self.next_index(),
            timestamp: unix_seconds(now_millis()),
            certificate_hashes,
            previous_hash,
            hash: String::new(),
        };
        block.hash = compute_block_hash(&block);
        self.chain.push(block.clone());
        block
    }

    /// Queue a hash for the next block. Returns `false` if it is already
    /// sealed or already pending.
    pub fn add_certificate(&mut self, certificate_hash: &str) -> bool {
        if self.certificate_exists(certificate_hash) {
            return false;
        }
        self.pending.push(certificate_hash.to_string());
        true
    }

    /// Seal every pending hash into one block.
    pub fn mine_pending(&mut self) -> Option<Block> {
        if self.pending.is_empty() {
            return None;
        }
        let previous_hash = self.chain.last().map(|b| b.hash.clone()).unwrap_or_default();
        let hashes = std::mem::take(&mut self.pending);
        let block = self.create_block(hashes, previous_hash);
        debug!(index = block.index, hash = %block.hash, "mined block");
        Some(block)
    }

    pub fn certificate_exists(&self, certificate_hash: &str) -> bool {
        self.chain.iter().any(|b| b.contains(certificate_hash))
            || self.pending.iter().any(|h| h == certificate_hash)
    }

    /// Re-check every link and recompute every non-genesis block hash.
    pub fn is_valid(&self) -> bool {
        self.chain.windows(2).all(|w| {
            let (previous, current) = (&w[0], &w[1]);
            current.previous_hash == previous.hash && current.hash == compute_block_hash(current)
        })
    }

    pub fn snapshot(&self) -> ChainData {
        ChainData {
            length: self.chain.len(),
            is_valid: self.is_valid(),
            pending_certificates: self.pending.clone(),
            chain: self.chain.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}
