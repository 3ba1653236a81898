use {
    anyhow::Result,
    async_trait::async_trait,
    parlor_common::types::{ChatType, ReplyKind, ReplyPayload},
    serde::Serialize,
};

// ── Dispatch context ────────────────────────────────────────────────────────

/// The conversation peer a dispatch run replies to.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelPeer {
    pub kind: ChatType,
    pub id: String,
}

/// Routed context for one command, handed to the reply dispatcher.
///
/// Built fresh per invocation by the authorization pipeline; the dispatcher
/// must not retain it across commands.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchContext {
    pub account_id: String,
    pub agent_id: String,
    pub session_key: String,
    pub peer: ChannelPeer,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Set by the pipeline on every path that reaches dispatch. Consumed
    /// downstream by the dispatch layer.
    pub authorized: bool,
}

/// Per-dispatch options.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Restrict the agent run to these skills; `None` means no restriction.
    pub skill_filter: Option<Vec<String>>,
}

/// How many replies of each kind a dispatch run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyCounts {
    pub finals: usize,
    pub tools: usize,
    pub blocks: usize,
}

impl ReplyCounts {
    /// Total replies across all kinds.
    pub fn total(&self) -> usize {
        self.finals + self.tools + self.blocks
    }
}

// ── Collaborator traits ─────────────────────────────────────────────────────

/// Receives replies as a dispatch run produces them.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one produced reply to the invoking user.
    async fn deliver(&self, payload: ReplyPayload);

    /// A single reply failed to produce; delivery of the rest continues.
    async fn dispatch_error(&self, message: &str, kind: ReplyKind);
}

/// The downstream agent dispatch layer.
///
/// The pipeline owns authorization and context construction; everything past
/// that point (model calls, tool use, reply assembly) lives behind this
/// trait.
#[async_trait]
pub trait ReplyDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        context: &DispatchContext,
        options: DispatchOptions,
        sink: &dyn ReplySink,
    ) -> Result<ReplyCounts>;
}
