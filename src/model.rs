//! Data model for certificate blocks and the chain snapshot shared by both modes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// `previous_hash` recorded on the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// `hash` of the offline genesis block.
pub const GENESIS_HASH: &str = "genesis";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-indexed, contiguous position in the chain.
    pub index: u64,
    /// Seconds since the Unix epoch at creation. Informational only.
    pub timestamp: f64,
    /// Certificate hashes sealed in this block; empty for genesis.
    #[serde(default)]
    pub certificate_hashes: Vec<String>,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    pub fn contains(&self, certificate_hash: &str) -> bool {
        self.certificate_hashes.iter().any(|h| h == certificate_hash)
    }
}

/// Chain snapshot as returned by `GET /chain` and by the offline store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainData {
    pub length: usize,
    pub is_valid: bool,
    /// Always empty offline; kept so both modes expose the same shape.
    #[serde(default)]
    pub pending_certificates: Vec<String>,
    pub chain: Vec<Block>,
}

impl ChainData {
    /// Fresh single-block chain for the offline store.
    pub fn genesis() -> Self {
        let block = Block {
            index: 1,
            timestamp: unix_seconds(now_millis()),
            certificate_hashes: Vec::new(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
        };
        Self {
            length: 1,
            is_valid: true,
            pending_certificates: Vec::new(),
            chain: vec![block],
        }
    }

    /// Full scan of every block for `certificate_hash`.
    pub fn contains(&self, certificate_hash: &str) -> bool {
        self.chain.iter().any(|b| b.contains(certificate_hash))
    }

    pub fn last(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Index and `previous_hash` linkage check. Block hashes are opaque here.
    pub fn is_linked(&self) -> bool {
        let Some(first) = self.chain.first() else {
            return false;
        };
        if first.index != 1 {
            return false;
        }
        self.chain
            .windows(2)
            .all(|w| w[1].previous_hash == w[0].hash && w[1].index == w[0].index + 1)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

pub fn unix_seconds(millis: i128) -> f64 {
    millis as f64 / 1000.0
}

/// Hash inputs (concatenate as bytes, SHA-256) and return lowercase hex.
pub fn hash_concat(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    hex::encode(hasher.finalize())
}

/// Header fields in sorted key order; `hash` is excluded.
#[derive(Serialize)]
struct BlockHeader<'a> {
    certificate_hashes: &'a [String],
    index: u64,
    previous_hash: &'a str,
    timestamp: f64,
}

/// SHA-256 over the block's canonical JSON header.
pub fn compute_block_hash(b: &Block) -> String {
    let header = BlockHeader {
        certificate_hashes: &b.certificate_hashes,
        index: b.index,
        previous_hash: &b.previous_hash,
        timestamp: b.timestamp,
    };
    // A plain struct of strings and numbers always serializes.
    let encoded = serde_json::to_vec(&header).unwrap_or_default();
    hash_concat(&[&encoded])
}
