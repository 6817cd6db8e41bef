use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockConfig {
    pub blocked_apps: BTreeSet<String>,
    pub blocking_enabled: bool,
}

impl BlockConfig {
    /// Exact match against the package identifier; no prefix or case folding.
    pub fn is_blocked(&self, package_name: &str) -> bool {
        self.blocked_apps.contains(package_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_exact() {
        let config = BlockConfig {
            blocked_apps: ["com.example.feed".to_string()].into_iter().collect(),
            blocking_enabled: true,
        };

        assert!(config.is_blocked("com.example.feed"));
        assert!(!config.is_blocked("com.example"));
        assert!(!config.is_blocked("COM.EXAMPLE.FEED"));
        assert!(!config.is_blocked("com.example.feed.lite"));
    }
}
