//! Certificate issuance and verification against a demo blockchain.
//!
//! Requests go either to a remote ledger backend ([`routes`] is a reference
//! implementation) or to a local simulation ([`offline`]), chosen per call by
//! the [`router`]. Both paths answer with the same [`api::ApiResponse`].

pub mod api;
pub mod config;
pub mod demo_hash;
pub mod error;
pub mod insights;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod offline;
pub mod router;
pub mod routes;
pub mod settings;
pub mod storage;

pub use api::{ApiResponse, Mode};
pub use error::{RouterError, StoreError};
pub use offline::OfflineChainStore;
pub use router::{Connectivity, RequestRouter};
