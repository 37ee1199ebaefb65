//! Dispatch of certificate operations to the offline store or a remote backend.
//!
//! Both paths return the same [`ApiResponse`] shape. The only difference a
//! caller can observe is [`RouterError::Unreachable`], raised when an online
//! request produced no usable response.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiResponse, Mode};
use crate::error::RouterError;
use crate::offline::OfflineChainStore;
use crate::settings::{clean_base_url, Preferences};

/// Logical operations shared by both modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Issue { certificate: String },
    Verify { certificate: String },
    GetChain,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Issue { .. } => "/issue",
            Operation::Verify { .. } => "/verify",
            Operation::GetChain => "/chain",
        }
    }
}

/// Connectivity indicator. Reflects the lifecycle of the latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Connectivity {
    Idle,
    Requesting,
    Connected,
    ResponseError,
    Unreachable,
    Offline,
}

impl Connectivity {
    pub fn label(self) -> &'static str {
        match self {
            Connectivity::Idle => "API: Idle",
            Connectivity::Requesting => "API: Request in progress...",
            Connectivity::Connected => "API: Connected",
            Connectivity::ResponseError => "API: Response error",
            Connectivity::Unreachable => "API: Offline / Unreachable",
            Connectivity::Offline => "Mode: Offline Demo (No API)",
        }
    }
}

/// One way of serving an [`Operation`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, op: &Operation) -> Result<ApiResponse, RouterError>;
}

/// Serves operations from the local chain simulation. Never touches the network.
#[derive(Clone)]
pub struct OfflineTransport {
    store: OfflineChainStore,
}

impl OfflineTransport {
    pub fn new(store: OfflineChainStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Transport for OfflineTransport {
    async fn send(&self, op: &Operation) -> Result<ApiResponse, RouterError> {
        let response = match op {
            Operation::Issue { certificate } => self.store.issue(Some(certificate.as_str()))?,
            Operation::Verify { certificate } => self.store.verify(Some(certificate.as_str()))?,
            Operation::GetChain => self.store.get_chain()?,
        };
        Ok(response)
    }
}

/// Serves operations over HTTP against `{base_url}/issue|verify|chain`.
///
/// No timeout and no retry: the call waits on the transport until it
/// answers or fails.
#[derive(Clone)]
pub struct OnlineTransport {
    client: reqwest::Client,
    base_url: String,
}

impl OnlineTransport {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: clean_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for OnlineTransport {
    async fn send(&self, op: &Operation) -> Result<ApiResponse, RouterError> {
        let url = format!("{}{}", self.base_url, op.path());
        let unreachable = |reason: String| RouterError::Unreachable {
            url: url.clone(),
            reason,
        };

        let request = match op {
            Operation::Issue { certificate } | Operation::Verify { certificate } => self
                .client
                .post(&url)
                .json(&json!({ "certificate": certificate })),
            Operation::GetChain => self.client.get(&url),
        };

        let response = request.send().await.map_err(|e| unreachable(e.to_string()))?;
        let status = response.status().as_u16();
        let data = response
            .json::<Value>()
            .await
            .map_err(|e| unreachable(format!("invalid response body: {e}")))?;
        Ok(ApiResponse { status, data })
    }
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-invocation overrides that take precedence over persisted preferences.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<Mode>,
    pub base_url: Option<String>,
}

/// Single entry point for issue/verify/chain, whatever the mode.
pub struct RequestRouter {
    prefs: Preferences,
    offline: OfflineTransport,
    client: reqwest::Client,
    overrides: Overrides,
    status: watch::Sender<Connectivity>,
}

impl RequestRouter {
    pub fn new(prefs: Preferences, offline: OfflineChainStore) -> Self {
        let (status, _) = watch::channel(Connectivity::Idle);
        Self {
            prefs,
            offline: OfflineTransport::new(offline),
            client: reqwest::Client::new(),
            overrides: Overrides::default(),
            status,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Mode in effect right now; preferences are re-read on every call.
    pub fn current_mode(&self) -> Result<Mode, RouterError> {
        match self.overrides.mode {
            Some(mode) => Ok(mode),
            None => Ok(self.prefs.load_mode()?),
        }
    }

    pub fn current_base_url(&self) -> Result<String, RouterError> {
        match &self.overrides.base_url {
            Some(url) => Ok(clean_base_url(url)),
            None => Ok(self.prefs.load_base_url()?),
        }
    }

    pub fn status(&self) -> Connectivity {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.status.subscribe()
    }

    fn set_status(&self, next: Connectivity) {
        let prev = self.status.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "connectivity changed");
        }
    }

    /// Run `op` in the given mode.
    pub async fn dispatch(&self, mode: Mode, op: Operation) -> Result<ApiResponse, RouterError> {
        match mode {
            Mode::Offline => {
                self.set_status(Connectivity::Offline);
                self.offline.send(&op).await
            }
            Mode::Online => {
                let transport = OnlineTransport::new(self.client.clone(), &self.current_base_url()?);
                self.set_status(Connectivity::Requesting);
                match transport.send(&op).await {
                    Ok(response) => {
                        if response.is_success() {
                            self.set_status(Connectivity::Connected);
                        } else {
                            warn!(path = op.path(), status = response.status, "backend returned an error status");
                            self.set_status(Connectivity::ResponseError);
                        }
                        Ok(response)
                    }
                    Err(e) => {
                        warn!(error = %e, "backend request failed");
                        self.set_status(Connectivity::Unreachable);
                        Err(e)
                    }
                }
            }
        }
    }

    pub async fn issue_certificate(&self, certificate: &str) -> Result<ApiResponse, RouterError> {
        let mode = self.current_mode()?;
        self.dispatch(
            mode,
            Operation::Issue {
                certificate: certificate.to_string(),
            },
        )
        .await
    }

    pub async fn verify_certificate(&self, certificate: &str) -> Result<ApiResponse, RouterError> {
        let mode = self.current_mode()?;
        self.dispatch(
            mode,
            Operation::Verify {
                certificate: certificate.to_string(),
            },
        )
        .await
    }

    pub async fn get_chain(&self) -> Result<ApiResponse, RouterError> {
        let mode = self.current_mode()?;
        self.dispatch(mode, Operation::GetChain).await
    }

    /// Probe the backend with `GET /chain`. Skipped in offline mode.
    pub async fn test_connection(&self) -> Result<ConnectionReport, RouterError> {
        if self.current_mode()? == Mode::Offline {
            return Ok(ConnectionReport {
                status: "skipped",
                base_url: None,
                http_status: None,
                chain_length: None,
                is_valid: None,
                message: Some("Offline Demo mode is active. No backend call needed.".into()),
            });
        }

        let base_url = self.current_base_url()?;
        let response = self.dispatch(Mode::Online, Operation::GetChain).await?;
        info!(%base_url, status = response.status, "connection test completed");
        Ok(ConnectionReport {
            status: "ok",
            base_url: Some(base_url),
            http_status: Some(response.status),
            chain_length: response.data.get("length").and_then(Value::as_u64),
            is_valid: response.data.get("is_valid").and_then(Value::as_bool),
            message: None,
        })
    }
}
