use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{Error, Result};

/// Session key for one agent conversation: agent id + command namespace +
/// sender id. Stable across invocations, so repeated commands from the same
/// sender continue the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(agent_id: &str, namespace: &str, peer_id: &str) -> Self {
        Self(format!("{agent_id}:{namespace}:{peer_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One agent binding. The most specific populated selector wins; see the
/// cascade in the crate docs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentBinding {
    pub agent_id: String,
    pub peer_id: Option<String>,
    pub team_id: Option<String>,
    pub account_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default_agent: Option<String>,
    pub bindings: Vec<AgentBinding>,
}

/// Identity of one inbound command, for binding resolution.
#[derive(Debug, Clone)]
pub struct RouteRequest<'a> {
    pub account_id: &'a str,
    pub team_id: Option<&'a str>,
    pub channel_id: &'a str,
    pub peer_id: &'a str,
    /// Command namespace folded into the session key (e.g. `slack:cmd:ask`).
    pub namespace: &'a str,
}

/// Resolved route: which agent handles this command and the session key.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub agent_id: String,
    pub session_key: SessionKey,
    pub account_id: String,
}

/// Resolve which agent should handle a command, following the binding cascade.
pub fn resolve_agent_route(
    config: &RoutingConfig,
    request: &RouteRequest<'_>,
) -> Result<ResolvedRoute> {
    let bindings = &config.bindings;

    let bound = bindings
        .iter()
        .find(|b| b.peer_id.as_deref() == Some(request.peer_id))
        .or_else(|| {
            request
                .team_id
                .and_then(|team| bindings.iter().find(|b| b.team_id.as_deref() == Some(team)))
        })
        .or_else(|| {
            bindings
                .iter()
                .find(|b| b.account_id.as_deref() == Some(request.account_id))
        })
        .or_else(|| {
            bindings
                .iter()
                .find(|b| b.channel_id.as_deref() == Some(request.channel_id))
        })
        .map(|b| b.agent_id.as_str());

    let agent_id = bound
        .or(config.default_agent.as_deref())
        .ok_or(Error::NotConfigured)?;

    debug!(agent_id, peer_id = request.peer_id, "resolved agent route");

    Ok(ResolvedRoute {
        agent_id: agent_id.to_string(),
        session_key: SessionKey::new(agent_id, request.namespace, request.peer_id),
        account_id: request.account_id.to_string(),
    })
}
