//! Channel-agnostic access policy and dispatch contracts.
//!
//! Platform crates (Slack, and whatever comes next) share the allowlist
//! matcher, the DM/group access policies, and the reply-dispatch collaborator
//! traits defined here. Nothing in this crate talks to a chat platform.

pub mod dispatch;
pub mod gating;
pub mod store;

pub use {
    dispatch::{
        ChannelPeer, DispatchContext, DispatchOptions, ReplyCounts, ReplyDispatcher, ReplySink,
    },
    store::{AllowStore, MemoryAllowStore},
};
