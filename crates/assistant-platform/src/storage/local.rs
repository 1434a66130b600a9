//! `window.localStorage` backend.
//! Persistent across page reloads; values are stored as UTF-8 strings.

use async_trait::async_trait;
use web_sys::Storage;

use assistant_core::ports::StoragePort;
use assistant_types::{AssistantError, Result};

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| AssistantError::Storage("No window object".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| AssistantError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| AssistantError::Storage("localStorage not available".to_string()))?;

        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .storage
            .get_item(key)
            .map_err(|e| AssistantError::Storage(format!("{:?}", e)))?;
        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| AssistantError::Storage(format!("{} is not UTF-8: {}", key, e)))?;
        // Throws QuotaExceededError when the origin is full
        self.storage
            .set_item(key, text)
            .map_err(|e| AssistantError::Storage(format!("{:?}", e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| AssistantError::Storage(format!("{:?}", e)))
    }

    fn backend_name(&self) -> &str {
        "localStorage"
    }
}
