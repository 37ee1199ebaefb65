//! Local simulation of the certificate chain, persisted as one JSON blob.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiResponse, IssueBody, Mode, VerifyBody};
use crate::demo_hash::demo_hash;
use crate::error::StoreError;
use crate::model::{now_millis, unix_seconds, Block, ChainData};
use crate::normalize::normalize;
use crate::storage::KvStore;

/// Key of the persisted chain blob.
pub const OFFLINE_CHAIN_KEY: &str = "bcvs_offline_chain";

pub const EMPTY_CERTIFICATE: &str = "Certificate text is required.";

#[derive(Clone)]
pub struct OfflineChainStore {
    store: Arc<dyn KvStore>,
}

impl OfflineChainStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Read the persisted chain. A missing or unreadable blob is replaced
    /// with a fresh genesis chain, which is written back and returned.
    pub fn load(&self) -> Result<ChainData, StoreError> {
        let raw = match self.store.get(OFFLINE_CHAIN_KEY) {
            Err(StoreError::Corrupt { .. }) => {
                warn!("offline chain is not valid text; resetting to genesis");
                None
            }
            other => other?,
        };
        match raw.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(raw) => match serde_json::from_str::<ChainData>(raw) {
                Ok(data) if !data.chain.is_empty() => return Ok(data),
                Ok(_) => warn!("offline chain has no blocks; resetting to genesis"),
                Err(e) => warn!(error = %e, "offline chain is corrupt; resetting to genesis"),
            },
        }
        let genesis = ChainData::genesis();
        self.save(&genesis)?;
        debug!("initialized offline chain with genesis block");
        Ok(genesis)
    }

    /// Overwrite the persisted chain.
    pub fn save(&self, data: &ChainData) -> Result<(), StoreError> {
        let json = serde_json::to_string(data).map_err(|source| StoreError::Serialize {
            key: OFFLINE_CHAIN_KEY.to_string(),
            source,
        })?;
        self.store.set(OFFLINE_CHAIN_KEY, &json)
    }

    /// Record a certificate in a new block.
    ///
    /// Issuing text that is already on the chain returns 200 and leaves the
    /// chain untouched. The load/append/save sequence holds no lock: two
    /// concurrent issues can read the same chain and the later save wins,
    /// dropping the other block.
    pub fn issue(&self, certificate: Option<&str>) -> Result<ApiResponse, StoreError> {
        let text = normalize(certificate);
        if text.is_empty() {
            return Ok(ApiResponse::error(400, EMPTY_CERTIFICATE));
        }

        let hash = demo_hash(&text);
        let mut data = self.load()?;
        if data.contains(&hash) {
            debug!(certificate_hash = %hash, "certificate already on offline chain");
            return Ok(ApiResponse::new(
                200,
                IssueBody {
                    message: "Certificate already exists (offline demo)".into(),
                    certificate_hash: hash,
                    block_index: None,
                    mode: None,
                },
            ));
        }

        let previous_hash = data
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_default();
        let now = now_millis();
        let block = Block {
            index: data.chain.len() as u64 + 1,
            timestamp: unix_seconds(now),
            certificate_hashes: vec![hash.clone()],
            previous_hash,
            hash: demo_hash(&format!("{hash}_{now}")),
        };
        let index = block.index;

        data.chain.push(block);
        data.length = data.chain.len();
        self.save(&data)?;
        info!(certificate_hash = %hash, block_index = index, "issued certificate offline");

        Ok(ApiResponse::new(
            201,
            IssueBody {
                message: "Certificate issued in Offline Demo Mode".into(),
                certificate_hash: hash,
                block_index: Some(index),
                mode: Some(Mode::Offline),
            },
        ))
    }

    /// Report whether the certificate appears in any block. Not found is a
    /// normal 200 answer.
    pub fn verify(&self, certificate: Option<&str>) -> Result<ApiResponse, StoreError> {
        let text = normalize(certificate);
        if text.is_empty() {
            return Ok(ApiResponse::error(400, EMPTY_CERTIFICATE));
        }

        let hash = demo_hash(&text);
        let found = self.load()?.contains(&hash);
        let explanation = if found {
            "Certificate found in Offline Demo chain."
        } else {
            "Certificate not found in Offline Demo chain."
        };
        Ok(ApiResponse::new(
            200,
            VerifyBody {
                valid: found,
                explanation: explanation.into(),
                mode: Some(Mode::Offline),
            },
        ))
    }

    pub fn get_chain(&self) -> Result<ApiResponse, StoreError> {
        Ok(ApiResponse::new(200, self.load()?))
    }
}
