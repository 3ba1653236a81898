use {anyhow::Result, async_trait::async_trait, parlor_common::types::ChatType};

/// Channel attributes fetched from the platform directory.
#[derive(Debug, Clone, Default)]
pub struct ChannelInfo {
    pub name: Option<String>,
    pub kind: Option<ChatType>,
    pub topic: Option<String>,
    pub purpose: Option<String>,
}

/// User attributes fetched from the platform directory.
#[derive(Debug, Clone, Default)]
pub struct UserInfo {
    pub name: Option<String>,
}

/// Identity of a channel, as much of it as the inbound event carried.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRef<'a> {
    pub id: &'a str,
    pub name: Option<&'a str>,
    pub kind: Option<ChatType>,
}

/// Platform directory collaborator: name/metadata lookups plus the coarse
/// channel filter the integration owner applies before any policy work.
#[async_trait]
pub trait SlackDirectory: Send + Sync {
    /// Channel metadata; `None` when the channel is unknown.
    async fn channel_info(&self, channel_id: &str) -> Result<Option<ChannelInfo>>;

    /// User metadata; `None` when the user is unknown.
    async fn user_info(&self, user_id: &str) -> Result<Option<UserInfo>>;

    /// Collaborator-owned channel predicate, evaluated before policy checks.
    async fn is_channel_allowed(&self, channel: &ChannelRef<'_>) -> bool;
}
