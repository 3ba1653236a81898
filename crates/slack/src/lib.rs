//! Slack slash-command integration: per-account configuration, access
//! policy, and the authorization/routing pipeline.
//!
//! The platform SDK transport is not owned here. The pipeline consumes the
//! directory, allow-store, pairing, and dispatch collaborators and produces a
//! single command-handling entry point; every user-visible response is an
//! ephemeral text message.

pub mod access;
pub mod commands;
pub mod config;
pub mod context;
pub mod directory;

pub use {
    commands::{CommandEvent, CommandResponder, CommandServices, SlashCommandHandler},
    config::{ChannelOverride, ResolvedChannelConfig, SlackAccountConfig, resolve_channel_config},
    directory::{ChannelInfo, ChannelRef, SlackDirectory, UserInfo},
};
