//! Pairing request state machine for unrecognized direct-message senders.
//!
//! When a channel account's DM policy is `pairing`, the first message from an
//! unknown sender creates a pending request carrying a short shareable code.
//! An operator approves the code out of band; approval promotes the sender
//! into the channel's stored allowlist and retires the request.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    parlor_channels::store::AllowStore,
    rand::Rng,
    serde::{Deserialize, Serialize},
};

/// How long a pending pairing request stays valid.
const PAIR_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pairing request not found")]
    RequestNotFound,

    #[error("pairing request expired")]
    RequestExpired,
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Types ───────────────────────────────────────────────────────────────────

/// Sender metadata captured with a pairing request, for operator display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairMeta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Pending,
    Approved,
    Rejected,
}

/// A pairing request for one `(channel, peer)` pair.
#[derive(Debug, Clone)]
pub struct PairRequest {
    pub id: String,
    pub channel: String,
    pub peer_id: String,
    pub meta: PairMeta,
    pub code: String,
    pub status: PairStatus,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// Result of an upsert: the shareable code, and whether the request is new.
///
/// The pipeline only messages the sender when `created` is true, so a peer
/// retrying before approval is not spammed with the same code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingTicket {
    pub code: String,
    pub created: bool,
}

// ── Pairing state ───────────────────────────────────────────────────────────

/// In-memory pairing state; tracks one pending request per `(channel, peer)`.
pub struct PairingState {
    pending: HashMap<(String, String), PairRequest>,
    ttl: Duration,
}

impl Default for PairingState {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingState {
    pub fn new() -> Self {
        Self::with_ttl(PAIR_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            ttl,
        }
    }

    /// Create or return the pending request for `(channel, peer_id)`.
    ///
    /// Idempotent while a request is pending: the existing code is returned
    /// with `created = false`. An expired request is replaced by a fresh one.
    pub fn upsert(&mut self, channel: &str, peer_id: &str, meta: PairMeta) -> PairingTicket {
        let now = Instant::now();
        let key = (channel.to_string(), peer_id.to_string());

        if let Some(existing) = self.pending.get(&key) {
            if now < existing.expires_at {
                return PairingTicket {
                    code: existing.code.clone(),
                    created: false,
                };
            }
            self.pending.remove(&key);
        }

        let code = generate_pair_code();
        let request = PairRequest {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.to_string(),
            peer_id: peer_id.to_string(),
            meta,
            code: code.clone(),
            status: PairStatus::Pending,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.pending.insert(key, request);

        PairingTicket {
            code,
            created: true,
        }
    }

    /// Approve the pending request carrying `code`.
    ///
    /// The request is retired; the caller promotes its peer into the allow
    /// store.
    pub fn approve(&mut self, code: &str) -> Result<PairRequest> {
        let mut request = self.take_by_code(code)?;
        if Instant::now() >= request.expires_at {
            return Err(Error::RequestExpired);
        }
        request.status = PairStatus::Approved;
        Ok(request)
    }

    /// Reject and retire the pending request carrying `code`.
    pub fn reject(&mut self, code: &str) -> Result<PairRequest> {
        let mut request = self.take_by_code(code)?;
        request.status = PairStatus::Rejected;
        Ok(request)
    }

    /// All non-expired pending requests.
    pub fn list_pending(&self) -> Vec<&PairRequest> {
        let now = Instant::now();
        self.pending.values().filter(|r| now < r.expires_at).collect()
    }

    /// Whether a non-expired request is pending for `(channel, peer_id)`.
    pub fn has_pending(&self, channel: &str, peer_id: &str) -> bool {
        self.pending
            .get(&(channel.to_string(), peer_id.to_string()))
            .is_some_and(|r| Instant::now() < r.expires_at)
    }

    /// Drop expired requests.
    pub fn evict_expired(&mut self) {
        let now = Instant::now();
        self.pending.retain(|_, r| now < r.expires_at);
    }

    fn take_by_code(&mut self, code: &str) -> Result<PairRequest> {
        let key = self
            .pending
            .iter()
            .find(|(_, r)| r.code == code)
            .map(|(k, _)| k.clone())
            .ok_or(Error::RequestNotFound)?;
        self.pending.remove(&key).ok_or(Error::RequestNotFound)
    }
}

/// Generate a random 6-digit pairing code.
fn generate_pair_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

// ── Collaborator trait ──────────────────────────────────────────────────────

/// Pairing contract consumed by the authorization pipeline.
#[async_trait]
pub trait PairingRequests: Send + Sync {
    /// Create or return the pending request for `(channel, peer_id)`.
    async fn upsert(
        &self,
        channel: &str,
        peer_id: &str,
        meta: PairMeta,
    ) -> anyhow::Result<PairingTicket>;
}

/// [`PairingRequests`] backed by in-process [`PairingState`].
#[derive(Default)]
pub struct MemoryPairing {
    state: tokio::sync::Mutex<PairingState>,
}

impl MemoryPairing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve `code` and append the request's peer to the channel's stored
    /// allowlist.
    pub async fn approve_into(
        &self,
        code: &str,
        store: &dyn AllowStore,
    ) -> anyhow::Result<PairRequest> {
        let request = self.state.lock().await.approve(code)?;
        store.append_allow(&request.channel, &request.peer_id).await?;
        Ok(request)
    }

    /// Reject `code`, retiring the request.
    pub async fn reject(&self, code: &str) -> anyhow::Result<PairRequest> {
        Ok(self.state.lock().await.reject(code)?)
    }

    /// Snapshot of pending requests (channel, peer, code).
    pub async fn pending(&self) -> Vec<(String, String, String)> {
        self.state
            .lock()
            .await
            .list_pending()
            .into_iter()
            .map(|r| (r.channel.clone(), r.peer_id.clone(), r.code.clone()))
            .collect()
    }
}

#[async_trait]
impl PairingRequests for MemoryPairing {
    async fn upsert(
        &self,
        channel: &str,
        peer_id: &str,
        meta: PairMeta,
    ) -> anyhow::Result<PairingTicket> {
        Ok(self.state.lock().await.upsert(channel, peer_id, meta))
    }
}
