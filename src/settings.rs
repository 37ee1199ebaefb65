//! Persisted client preferences: backend base URL and active mode.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::Mode;
use crate::error::{SettingsError, StoreError};
use crate::storage::KvStore;

pub const BASE_URL_KEY: &str = "bcvs_base_url";
pub const MODE_KEY: &str = "bcvs_mode";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Trim and drop one trailing `/`.
pub fn clean_base_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KvStore>,
    default_base_url: String,
}

impl Preferences {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_default_base_url(store, DEFAULT_BASE_URL)
    }

    pub fn with_default_base_url(store: Arc<dyn KvStore>, default_base_url: &str) -> Self {
        Self {
            store,
            default_base_url: clean_base_url(default_base_url),
        }
    }

    pub fn default_base_url(&self) -> &str {
        &self.default_base_url
    }

    pub fn load_base_url(&self) -> Result<String, StoreError> {
        Ok(match self.store.get(BASE_URL_KEY)? {
            Some(url) if !url.trim().is_empty() => clean_base_url(&url),
            _ => self.default_base_url.clone(),
        })
    }

    /// Falls back to online for a missing or unrecognized value.
    pub fn load_mode(&self) -> Result<Mode, StoreError> {
        let Some(raw) = self.store.get(MODE_KEY)? else {
            return Ok(Mode::default());
        };
        Ok(raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw.trim(), "ignoring unknown persisted mode");
            Mode::default()
        }))
    }

    pub fn save_base_url(&self, url: &str) -> Result<String, SettingsError> {
        let url = clean_base_url(url);
        if url.is_empty() {
            return Err(SettingsError::EmptyUrl);
        }
        self.store.set(BASE_URL_KEY, &url)?;
        info!(base_url = %url, "saved backend URL");
        Ok(url)
    }

    pub fn save_mode(&self, mode: Mode) -> Result<(), StoreError> {
        self.store.set(MODE_KEY, mode.as_str())?;
        info!(%mode, "saved mode");
        Ok(())
    }

    /// Restore the default URL and online mode.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.set(BASE_URL_KEY, &self.default_base_url)?;
        self.store.set(MODE_KEY, Mode::Online.as_str())?;
        info!("preferences reset to defaults");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn prefs() -> (Arc<MemoryStore>, Preferences) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), Preferences::new(kv))
    }

    #[test]
    fn defaults_when_nothing_saved() {
        let (_kv, p) = prefs();
        assert_eq!(p.load_base_url().unwrap(), DEFAULT_BASE_URL);
        assert_eq!(p.load_mode().unwrap(), Mode::Online);
    }

    #[test]
    fn save_cleans_url_and_rejects_blank() {
        let (_kv, p) = prefs();
        assert_eq!(p.save_base_url(" http://node:8080/ ").unwrap(), "http://node:8080");
        assert_eq!(p.load_base_url().unwrap(), "http://node:8080");
        assert!(matches!(p.save_base_url("  "), Err(SettingsError::EmptyUrl)));
        assert_eq!(p.load_base_url().unwrap(), "http://node:8080");
    }

    #[test]
    fn unknown_mode_falls_back_to_online() {
        let (kv, p) = prefs();
        kv.set(MODE_KEY, "sideways").unwrap();
        assert_eq!(p.load_mode().unwrap(), Mode::Online);
        p.save_mode(Mode::Offline).unwrap();
        assert_eq!(p.load_mode().unwrap(), Mode::Offline);
    }

    #[test]
    fn reset_restores_defaults() {
        let (_kv, p) = prefs();
        p.save_base_url("http://elsewhere").unwrap();
        p.save_mode(Mode::Offline).unwrap();
        p.reset().unwrap();
        assert_eq!(p.load_base_url().unwrap(), DEFAULT_BASE_URL);
        assert_eq!(p.load_mode().unwrap(), Mode::Online);
    }
}
