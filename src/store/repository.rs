use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::models::BlockConfig;

use super::{
    KeyValueStore, KEY_BLOCKED_APPS, KEY_BLOCKING_DISABLED_UNTIL, KEY_BLOCKING_ENABLED,
    KEY_NFC_TAG_ID,
};

/// Typed view over the settings keys. Missing or malformed values read as
/// their defaults.
#[derive(Clone)]
pub struct BlockedAppsRepository {
    store: Arc<dyn KeyValueStore>,
}

impl BlockedAppsRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn blocked_apps(&self) -> BTreeSet<String> {
        self.read(KEY_BLOCKED_APPS).unwrap_or_default()
    }

    pub fn set_blocked_apps(&self, apps: &BTreeSet<String>) -> Result<()> {
        self.write(KEY_BLOCKED_APPS, json!(apps))
    }

    pub fn is_blocking_enabled(&self) -> bool {
        self.read(KEY_BLOCKING_ENABLED).unwrap_or(false)
    }

    pub fn set_blocking_enabled(&self, enabled: bool) -> Result<()> {
        self.write(KEY_BLOCKING_ENABLED, json!(enabled))
    }

    pub fn registered_tag_id(&self) -> Option<String> {
        self.read(KEY_NFC_TAG_ID)
    }

    pub fn set_registered_tag_id(&self, tag_id: Option<&str>) -> Result<()> {
        match tag_id {
            Some(id) => self.write(KEY_NFC_TAG_ID, json!(id)),
            None => self
                .store
                .remove(KEY_NFC_TAG_ID)
                .with_context(|| format!("failed to clear {KEY_NFC_TAG_ID}")),
        }
    }

    /// Milliseconds since epoch; 0 means no unlock window.
    pub fn blocking_disabled_until(&self) -> i64 {
        self.read(KEY_BLOCKING_DISABLED_UNTIL).unwrap_or(0)
    }

    pub fn set_blocking_disabled_until(&self, until_ms: i64) -> Result<()> {
        self.write(KEY_BLOCKING_DISABLED_UNTIL, json!(until_ms))
    }

    pub fn block_config(&self) -> BlockConfig {
        BlockConfig {
            blocked_apps: self.blocked_apps(),
            blocking_enabled: self.is_blocking_enabled(),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("Ignoring malformed setting '{key}': {err}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: Value) -> Result<()> {
        self.store
            .set(key, value)
            .with_context(|| format!("failed to persist {key}"))
    }
}
