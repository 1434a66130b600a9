//! Persistence adapter: history, theme and config over a `StoragePort`.
//!
//! Loads never fail: missing or unparsable values fall back to defaults.

use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};
use assistant_types::{
    Result,
    config::{AssistantConfig, Theme},
    history::HistoryLog,
};

use crate::ports::StoragePort;

pub const HISTORY_KEY: &str = "assistant:history";
pub const THEME_KEY: &str = "assistant:theme";
pub const CONFIG_KEY: &str = "assistant:config";

#[derive(Clone)]
pub struct Persistence {
    storage: Rc<dyn StoragePort>,
}

impl Persistence {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    pub async fn load_history(&self) -> HistoryLog {
        self.load_or_default(HISTORY_KEY).await
    }

    pub async fn save_history(&self, history: &HistoryLog) -> Result<()> {
        self.save(HISTORY_KEY, history).await
    }

    /// Remove the stored history entirely
    pub async fn clear_history(&self) -> Result<()> {
        self.storage.delete(HISTORY_KEY).await
    }

    pub async fn load_theme(&self) -> Theme {
        self.load_or_default(THEME_KEY).await
    }

    pub async fn save_theme(&self, theme: Theme) -> Result<()> {
        self.save(THEME_KEY, &theme).await
    }

    /// Stored config, if any. Callers merge it over their defaults.
    pub async fn load_config(&self) -> Option<AssistantConfig> {
        self.load(CONFIG_KEY).await
    }

    pub async fn save_config(&self, config: &AssistantConfig) -> Result<()> {
        self.save(CONFIG_KEY, config).await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.storage.get(key).await {
            Ok(Some(data)) => match serde_json::from_slice(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Discarding unreadable {} from {}: {}", key, self.backend_name(), e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).await.unwrap_or_default()
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        self.storage.set(key, &json).await
    }
}
