//! Slash-command authorization pipeline.
//!
//! Each inbound command walks an ordered list of short-circuit checks
//! (empty prompt, self-message, the collaborator channel filter, DM or room
//! policy, per-user allowlist), then builds the routed context and hands it
//! to the dispatch layer. Policy rejections answer with a specific ephemeral
//! message; any unexpected failure is caught once at the top and answered
//! with a generic one. The inbound event is acknowledged before any slow
//! work, to stay inside the platform's interaction deadline.

use std::sync::Arc;

use {
    anyhow::{Context as _, Result},
    async_trait::async_trait,
    parlor_channels::{
        dispatch::{ChannelPeer, DispatchContext, DispatchOptions, ReplyDispatcher, ReplySink},
        gating::DmPolicy,
        store::AllowStore,
    },
    parlor_common::types::{ChatType, ReplyKind, ReplyPayload},
    parlor_pairing::{PairMeta, PairingRequests},
    parlor_routing::{RouteRequest, RoutingConfig, resolve_agent_route},
    tracing::{debug, error, warn},
};

use crate::{
    access::{self, AccessDenied},
    config::{ResolvedChannelConfig, SlackAccountConfig, resolve_channel_config},
    context::{channel_description, compose_system_prompt, peer_kind},
    directory::{ChannelRef, SlackDirectory},
};

const REPLY_NO_OUTPUT: &str = "The agent produced no output for this command.";
const REPLY_FAILED: &str = "Sorry, something went wrong while handling that command.";

/// One inbound slash-command event, reduced to the fields the pipeline reads.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub team_id: Option<String>,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub user_id: String,
    /// Command name without the leading slash.
    pub command: String,
    /// Prompt text following the command.
    pub text: String,
}

/// Platform ack/respond surface for one invocation. Every response is an
/// ephemeral text message, visible only to the invoking user.
#[async_trait]
pub trait CommandResponder: Send + Sync {
    /// Acknowledge receipt within the platform's interaction deadline.
    async fn ack(&self) -> Result<()>;

    /// Send an ephemeral text reply.
    async fn respond(&self, text: &str) -> Result<()>;
}

/// Collaborators the pipeline delegates to.
pub struct CommandServices {
    pub directory: Arc<dyn SlackDirectory>,
    pub allow_store: Arc<dyn AllowStore>,
    pub pairing: Arc<dyn PairingRequests>,
    pub dispatcher: Arc<dyn ReplyDispatcher>,
}

/// Result of an allow-store read that must not block authorization.
///
/// Both arms currently degrade to the same decision input, but keeping them
/// distinct lets persistent storage failure be alerted on without touching
/// the decision contract.
enum StoredAllow {
    Entries(Vec<String>),
    /// Read failed; decisions fall back to static configuration only.
    Unavailable,
}

impl StoredAllow {
    fn entries(self) -> Vec<String> {
        match self {
            Self::Entries(entries) => entries,
            Self::Unavailable => Vec::new(),
        }
    }
}

/// Authorization and routing pipeline for one Slack account's slash command.
pub struct SlashCommandHandler {
    account_id: String,
    bot_user_id: Option<String>,
    config: SlackAccountConfig,
    routing: RoutingConfig,
    directory: Arc<dyn SlackDirectory>,
    allow_store: Arc<dyn AllowStore>,
    pairing: Arc<dyn PairingRequests>,
    dispatcher: Arc<dyn ReplyDispatcher>,
}

impl SlashCommandHandler {
    pub fn new(
        account_id: impl Into<String>,
        bot_user_id: Option<String>,
        config: SlackAccountConfig,
        routing: RoutingConfig,
        services: CommandServices,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            bot_user_id,
            config,
            routing,
            directory: services.directory,
            allow_store: services.allow_store,
            pairing: services.pairing,
            dispatcher: services.dispatcher,
        }
    }

    /// Handle one slash-command event.
    ///
    /// Never panics and never propagates an error: policy rejections answer
    /// inline, and any unexpected failure is logged and answered with a
    /// generic ephemeral message.
    pub async fn handle(&self, event: &CommandEvent, responder: &dyn CommandResponder) {
        if let Err(error) = self.handle_inner(event, responder).await {
            error!(
                account_id = %self.account_id,
                channel_id = %event.channel_id,
                %error,
                "slash command failed"
            );
            if let Err(respond_error) = responder.respond(REPLY_FAILED).await {
                warn!(%respond_error, "failed to deliver failure message");
            }
        }
    }

    async fn handle_inner(
        &self,
        event: &CommandEvent,
        responder: &dyn CommandResponder,
    ) -> Result<()> {
        // An empty prompt is not a real invocation; answer with usage and
        // skip the acknowledgment.
        let prompt = event.text.trim();
        if prompt.is_empty() {
            let usage = format!("Nothing to run: add a prompt after `/{}`.", event.command);
            responder.respond(&usage).await?;
            return Ok(());
        }

        // Our own message looped back: drop without any response.
        if self.bot_user_id.as_deref() == Some(event.user_id.as_str()) {
            debug!(account_id = %self.account_id, "ignoring self-originated command");
            return Ok(());
        }

        // Collaborator-owned channel filter, before any policy work.
        let channel = ChannelRef {
            id: &event.channel_id,
            name: event.channel_name.as_deref(),
            kind: None,
        };
        if !self.directory.is_channel_allowed(&channel).await {
            return self.reject(event, responder, AccessDenied::ChannelNotAllowed).await;
        }

        // Ack before config/store resolution and dispatch.
        responder.ack().await.context("acknowledge command")?;

        let info = self
            .directory
            .channel_info(&event.channel_id)
            .await
            .context("resolve channel info")?
            .unwrap_or_default();
        let kind = peer_kind(&event.channel_id, info.kind);
        let channel_name = event.channel_name.as_deref().or(info.name.as_deref());

        let peer_name = self
            .directory
            .user_info(&event.user_id)
            .await
            .context("resolve user info")?
            .and_then(|user| user.name);

        let resolved = match kind {
            ChatType::Dm => {
                if !self.check_dm(event, peer_name.as_deref(), responder).await? {
                    return Ok(());
                }
                None
            },
            ChatType::Group | ChatType::Channel => {
                match self.check_room(event, kind, channel_name, peer_name.as_deref()) {
                    Ok(resolved) => Some(resolved),
                    Err(denied) => return self.reject(event, responder, denied).await,
                }
            },
        };

        // Routed context: peer kind, agent route, channel description,
        // system prompt.
        let namespace = format!("slack:cmd:{}", event.command);
        let route = resolve_agent_route(&self.routing, &RouteRequest {
            account_id: &self.account_id,
            team_id: event.team_id.as_deref(),
            channel_id: &event.channel_id,
            peer_id: &event.user_id,
            namespace: &namespace,
        })
        .context("resolve agent route")?;

        let description = channel_description(info.topic.as_deref(), info.purpose.as_deref());
        let system_prompt = compose_system_prompt(
            description.as_deref(),
            resolved.as_ref().and_then(|r| r.system_prompt.as_deref()),
        );

        let context = DispatchContext {
            account_id: route.account_id.clone(),
            agent_id: route.agent_id.clone(),
            session_key: route.session_key.to_string(),
            peer: ChannelPeer {
                kind,
                id: event.user_id.clone(),
            },
            prompt: prompt.to_string(),
            system_prompt,
            authorized: true,
        };
        let options = DispatchOptions {
            skill_filter: resolved.as_ref().and_then(|r| r.skills.clone()),
        };

        // Dispatch; silence is answered explicitly.
        let sink = ResponderSink { responder };
        let counts = self
            .dispatcher
            .dispatch(&context, options, &sink)
            .await
            .context("dispatch command")?;
        debug!(
            account_id = %self.account_id,
            session_key = %context.session_key,
            finals = counts.finals,
            tools = counts.tools,
            blocks = counts.blocks,
            "command dispatched"
        );
        if counts.total() == 0 {
            responder.respond(REPLY_NO_OUTPUT).await?;
        }
        Ok(())
    }

    /// DM-policy decision, including the pairing fallback. Returns whether
    /// the pipeline should continue to dispatch.
    async fn check_dm(
        &self,
        event: &CommandEvent,
        peer_name: Option<&str>,
        responder: &dyn CommandResponder,
    ) -> Result<bool> {
        let mut allowlist = self.config.dm_allowlist.clone();
        if matches!(self.config.dm_policy, DmPolicy::Pairing | DmPolicy::Allowlist) {
            allowlist.extend(self.stored_allow(&event.channel_id).await.entries());
        }

        match access::check_dm_access(self.config.dm_policy, &allowlist, &event.user_id, peer_name)
        {
            Ok(()) => Ok(true),
            Err(AccessDenied::PairingRequired) => {
                let meta = PairMeta {
                    name: peer_name.map(str::to_string),
                };
                let ticket = self
                    .pairing
                    .upsert(&event.channel_id, &event.user_id, meta)
                    .await
                    .context("upsert pairing request")?;
                if ticket.created {
                    let text = format!(
                        "You are not paired with this bot yet. Ask an operator to approve \
                         pairing code `{}`, then send your command again.",
                        ticket.code
                    );
                    responder.respond(&text).await?;
                } else {
                    debug!(
                        account_id = %self.account_id,
                        user_id = %event.user_id,
                        "pairing already pending; not resending code"
                    );
                }
                Ok(false)
            },
            Err(denied) => {
                self.reject(event, responder, denied).await?;
                Ok(false)
            },
        }
    }

    /// Room-policy decision: channel config, access-group gate, and, for
    /// named rooms only, the per-user allowlist. Groups are gated by
    /// channel access alone.
    fn check_room(
        &self,
        event: &CommandEvent,
        kind: ChatType,
        channel_name: Option<&str>,
        peer_name: Option<&str>,
    ) -> std::result::Result<ResolvedChannelConfig, AccessDenied> {
        let resolved = resolve_channel_config(
            &event.channel_id,
            channel_name,
            &self.config.channels,
            self.config.default_require_mention,
        );

        access::check_channel_access(
            self.config.group_policy,
            !self.config.channels.is_empty(),
            &resolved,
        )?;

        if kind == ChatType::Channel {
            access::check_channel_users(&resolved, &event.user_id, peer_name)?;
        }

        Ok(resolved)
    }

    async fn stored_allow(&self, channel: &str) -> StoredAllow {
        match self.allow_store.read_allow(channel).await {
            Ok(entries) => StoredAllow::Entries(entries),
            Err(error) => {
                warn!(
                    account_id = %self.account_id,
                    channel,
                    %error,
                    "allow store read failed; using static config only"
                );
                StoredAllow::Unavailable
            },
        }
    }

    async fn reject(
        &self,
        event: &CommandEvent,
        responder: &dyn CommandResponder,
        denied: AccessDenied,
    ) -> Result<()> {
        debug!(
            account_id = %self.account_id,
            channel_id = %event.channel_id,
            user_id = %event.user_id,
            %denied,
            "command rejected"
        );
        responder.respond(&denied.to_string()).await?;
        Ok(())
    }
}

/// Forwards produced replies to the invoking user as ephemeral messages.
struct ResponderSink<'a> {
    responder: &'a dyn CommandResponder,
}

#[async_trait]
impl ReplySink for ResponderSink<'_> {
    async fn deliver(&self, payload: ReplyPayload) {
        if let Err(error) = self.responder.respond(&payload.text).await {
            warn!(%error, kind = ?payload.kind, "failed to deliver reply");
        }
    }

    async fn dispatch_error(&self, message: &str, kind: ReplyKind) {
        warn!(?kind, detail = message, "dispatch reported a reply error");
        let text = format!("Error producing a reply: {message}");
        if let Err(error) = self.responder.respond(&text).await {
            warn!(%error, "failed to deliver dispatch error");
        }
    }
}
