use std::collections::HashMap;

use {anyhow::Result, async_trait::async_trait, tokio::sync::Mutex};

/// Persistent per-channel allowlist entries (pairing-approved senders).
///
/// Reads may fail; callers degrade a failed read to "no stored entries"
/// rather than blocking the authorization decision.
#[async_trait]
pub trait AllowStore: Send + Sync {
    /// Stored allowlist entries for `channel`.
    async fn read_allow(&self, channel: &str) -> Result<Vec<String>>;

    /// Append an approved sender to `channel`'s stored allowlist.
    async fn append_allow(&self, channel: &str, entry: &str) -> Result<()>;
}

/// In-memory allow store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryAllowStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryAllowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AllowStore for MemoryAllowStore {
    async fn read_allow(&self, channel: &str) -> Result<Vec<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(channel).cloned().unwrap_or_default())
    }

    async fn append_allow(&self, channel: &str, entry: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let list = entries.entry(channel.to_string()).or_default();
        if !list.iter().any(|e| e == entry) {
            list.push(entry.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_unknown_channel_is_empty() {
        let store = MemoryAllowStore::new();
        assert!(store.read_allow("C1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_read() {
        let store = MemoryAllowStore::new();
        store.append_allow("D1", "U42").await.unwrap();
        store.append_allow("D1", "U43").await.unwrap();
        assert_eq!(store.read_allow("D1").await.unwrap(), vec!["U42", "U43"]);
    }

    #[tokio::test]
    async fn append_is_idempotent() {
        let store = MemoryAllowStore::new();
        store.append_allow("D1", "U42").await.unwrap();
        store.append_allow("D1", "U42").await.unwrap();
        assert_eq!(store.read_allow("D1").await.unwrap(), vec!["U42"]);
    }
}
