//! Route inbound commands to agents and build session keys.
//!
//! Binding cascade (precedence):
//! 1. Peer binding (exact peer ID match)
//! 2. Team binding (workspace/team ID)
//! 3. Account binding (channel account ID)
//! 4. Channel binding (channel ID)
//! 5. Default agent (`routing.default_agent`)

pub mod error;
pub mod resolve;

pub use {
    error::{Error, Result},
    resolve::{
        AgentBinding, ResolvedRoute, RouteRequest, RoutingConfig, SessionKey, resolve_agent_route,
    },
};
