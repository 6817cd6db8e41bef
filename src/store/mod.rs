//! Durable key/value settings.
//!
//! Every consumer receives the store explicitly (usually wrapped in a
//! [`BlockedAppsRepository`]); there is no process-wide instance. Each `set`
//! or `remove` is written through before it returns and is atomic per key.
//! Nothing spans multiple keys.

mod file;
mod memory;
mod repository;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::BlockedAppsRepository;

use anyhow::Result;
use serde_json::Value;

pub const KEY_BLOCKED_APPS: &str = "blocked_apps";
pub const KEY_BLOCKING_ENABLED: &str = "blocking_enabled";
pub const KEY_NFC_TAG_ID: &str = "nfc_tag_id";
pub const KEY_BLOCKING_DISABLED_UNTIL: &str = "blocking_disabled_until";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
