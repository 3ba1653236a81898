use {
    parlor_channels::gating::{self, DmPolicy, GroupPolicy},
    parlor_common::types::ChatType,
};

use crate::config::ResolvedChannelConfig;

/// Reason a command was denied. `Display` is the user-visible rejection text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    ChannelNotAllowed,
    DmsDisabled,
    /// Not on the DM allowlist under the pairing policy; the pipeline runs
    /// the pairing flow instead of rejecting outright.
    PairingRequired,
    NotOnAllowlist,
    ChannelAccessDenied,
    UserNotAllowed,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelNotAllowed => write!(f, "This channel is not allowed to run commands."),
            Self::DmsDisabled => write!(f, "Direct-message commands are disabled."),
            Self::PairingRequired => write!(f, "You are not paired with this bot yet."),
            Self::NotOnAllowlist => write!(f, "You are not authorized to use this command."),
            Self::ChannelAccessDenied => {
                write!(f, "This channel is not authorized for commands.")
            },
            Self::UserNotAllowed => {
                write!(f, "You are not authorized to use this command here.")
            },
        }
    }
}

/// DM access decision for a sender. `allowlist` is the union of static
/// configuration and pairing-approved entries from the store.
pub fn check_dm_access(
    policy: DmPolicy,
    allowlist: &[String],
    peer_id: &str,
    peer_name: Option<&str>,
) -> Result<(), AccessDenied> {
    match policy {
        DmPolicy::Disabled => Err(AccessDenied::DmsDisabled),
        DmPolicy::Open => Ok(()),
        DmPolicy::Pairing => {
            if gating::allowlist_matches(allowlist, peer_id, peer_name) {
                Ok(())
            } else {
                Err(AccessDenied::PairingRequired)
            }
        },
        DmPolicy::Allowlist => {
            if gating::allowlist_matches(allowlist, peer_id, peer_name) {
                Ok(())
            } else {
                Err(AccessDenied::NotOnAllowlist)
            }
        },
    }
}

/// Room access decision: the group-policy gate ANDed with the channel's own
/// resolved `allowed` flag. An explicit `allowed: false` wins over any
/// policy verdict.
pub fn check_channel_access(
    group_policy: Option<GroupPolicy>,
    allowlist_configured: bool,
    resolved: &ResolvedChannelConfig,
) -> Result<(), AccessDenied> {
    let gate = match group_policy {
        None => true,
        Some(policy) => gating::channel_access_allowed(
            policy,
            allowlist_configured,
            resolved.matched && resolved.allowed,
        ),
    };

    if gate && resolved.allowed {
        Ok(())
    } else {
        Err(AccessDenied::ChannelAccessDenied)
    }
}

/// Per-user restriction from the channel's `users` list. `None` means the
/// channel is unrestricted; an empty configured list denies everyone.
pub fn check_channel_users(
    resolved: &ResolvedChannelConfig,
    peer_id: &str,
    peer_name: Option<&str>,
) -> Result<(), AccessDenied> {
    match &resolved.users {
        None => Ok(()),
        Some(users) => {
            if gating::allowlist_matches(users, peer_id, peer_name) {
                Ok(())
            } else {
                Err(AccessDenied::UserNotAllowed)
            }
        },
    }
}

/// Message-path activation: DMs are always handled; rooms and groups honor
/// the resolved `require_mention` flag.
pub fn should_handle_message(
    resolved: &ResolvedChannelConfig,
    chat: ChatType,
    bot_mentioned: bool,
) -> bool {
    match chat {
        ChatType::Dm => true,
        ChatType::Group | ChatType::Channel => !resolved.require_mention || bot_mentioned,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::resolve_channel_config;

    fn resolved(allowed: Option<bool>, matched: bool) -> ResolvedChannelConfig {
        ResolvedChannelConfig {
            allowed: allowed.unwrap_or(true),
            require_mention: true,
            users: None,
            system_prompt: None,
            skills: None,
            matched,
        }
    }

    #[test]
    fn open_dm_allows_anyone() {
        assert!(check_dm_access(DmPolicy::Open, &[], "U1", None).is_ok());
    }

    #[test]
    fn disabled_dm_rejects_everyone() {
        assert_eq!(
            check_dm_access(DmPolicy::Disabled, &["U1".into()], "U1", None),
            Err(AccessDenied::DmsDisabled)
        );
    }

    #[test]
    fn pairing_policy_signals_pairing_for_unknown_senders() {
        assert_eq!(
            check_dm_access(DmPolicy::Pairing, &[], "U1", None),
            Err(AccessDenied::PairingRequired)
        );
        assert!(check_dm_access(DmPolicy::Pairing, &["U1".into()], "U1", None).is_ok());
    }

    #[test]
    fn allowlist_policy_matches_by_id_or_name() {
        let list = vec!["U1".into(), "alice".into()];
        assert!(check_dm_access(DmPolicy::Allowlist, &list, "U1", None).is_ok());
        assert!(check_dm_access(DmPolicy::Allowlist, &list, "U2", Some("Alice")).is_ok());
        assert_eq!(
            check_dm_access(DmPolicy::Allowlist, &list, "U2", Some("Bob")),
            Err(AccessDenied::NotOnAllowlist)
        );
    }

    #[test]
    fn resolved_allowed_false_beats_permissive_policy() {
        // No allowlist configured and an open group policy would admit the
        // channel; the explicit allowed=false still wins.
        let denied = resolved(Some(false), true);
        assert_eq!(
            check_channel_access(Some(GroupPolicy::Open), false, &denied),
            Err(AccessDenied::ChannelAccessDenied)
        );
    }

    #[test]
    fn enforcement_off_still_honors_allowed_flag() {
        assert!(check_channel_access(None, true, &resolved(None, false)).is_ok());
        assert_eq!(
            check_channel_access(None, true, &resolved(Some(false), true)),
            Err(AccessDenied::ChannelAccessDenied)
        );
    }

    #[test]
    fn open_policy_with_configured_allowlist_requires_presence() {
        // The channel map is configured but this channel has no entry.
        assert_eq!(
            check_channel_access(Some(GroupPolicy::Open), true, &resolved(None, false)),
            Err(AccessDenied::ChannelAccessDenied)
        );
        assert!(check_channel_access(Some(GroupPolicy::Open), true, &resolved(None, true)).is_ok());
    }

    #[test]
    fn no_user_list_means_unrestricted() {
        let channels = HashMap::new();
        let resolved = resolve_channel_config("C1", None, &channels, None);
        assert!(check_channel_users(&resolved, "U1", None).is_ok());
    }

    #[test]
    fn empty_user_list_denies_everyone() {
        let mut config = resolved(None, true);
        config.users = Some(Vec::new());
        assert_eq!(
            check_channel_users(&config, "U1", Some("alice")),
            Err(AccessDenied::UserNotAllowed)
        );
    }

    #[test]
    fn user_list_matches_by_name_case_insensitively() {
        let mut config = resolved(None, true);
        config.users = Some(vec!["Alice".into()]);
        assert!(check_channel_users(&config, "U1", Some("alice")).is_ok());
        assert_eq!(
            check_channel_users(&config, "U1", Some("bob")),
            Err(AccessDenied::UserNotAllowed)
        );
    }

    #[test]
    fn dms_never_require_mentions() {
        let config = resolved(None, false);
        assert!(should_handle_message(&config, ChatType::Dm, false));
    }

    #[test]
    fn rooms_honor_require_mention() {
        let config = resolved(None, false); // require_mention = true
        assert!(!should_handle_message(&config, ChatType::Channel, false));
        assert!(should_handle_message(&config, ChatType::Channel, true));

        let mut relaxed = resolved(None, false);
        relaxed.require_mention = false;
        assert!(should_handle_message(&relaxed, ChatType::Group, false));
    }
}
