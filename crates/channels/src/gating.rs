use serde::{Deserialize, Serialize};

/// Check whether a peer is present on an allowlist.
///
/// Identifiers are compared exactly (platform IDs are case-sensitive);
/// display names are compared case-insensitively. A literal `"*"` entry
/// matches any peer. An empty list matches nobody; "no restriction
/// configured" is a caller decision, not a matcher one.
pub fn allowlist_matches(allowlist: &[String], peer_id: &str, name: Option<&str>) -> bool {
    let name = name.map(str::to_lowercase);
    for entry in allowlist {
        if entry == "*" || entry == peer_id {
            return true;
        }
        if let Some(name) = &name
            && entry.to_lowercase() == *name
        {
            return true;
        }
    }
    false
}

/// Decide whether group-policy enforcement admits a channel.
///
/// With no channel allowlist configured the policy alone decides; once an
/// allowlist is configured the channel must additionally be present and
/// allowed in it. Callers still AND the result with the channel's own
/// resolved `allowed` flag.
pub fn channel_access_allowed(
    policy: GroupPolicy,
    allowlist_configured: bool,
    channel_allowed: bool,
) -> bool {
    match policy {
        GroupPolicy::Disabled => false,
        GroupPolicy::Open => !allowlist_configured || channel_allowed,
        GroupPolicy::Allowlist => allowlist_configured && channel_allowed,
    }
}

/// DM access policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DmPolicy {
    /// Anyone can DM the bot.
    Open,
    /// Unknown senders are offered a pairing code.
    #[default]
    Pairing,
    /// Only senders on the allowlist.
    Allowlist,
    /// DMs disabled.
    Disabled,
}

/// Group/channel access policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupPolicy {
    /// Bot responds in all channels.
    #[default]
    Open,
    /// Only channels on the configured allowlist.
    Allowlist,
    /// Channels disabled.
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn empty_allowlist_matches_nobody() {
        assert!(!allowlist_matches(&[], "anyone", None));
        assert!(!allowlist_matches(&[], "anyone", Some("Anyone")));
    }

    #[test]
    fn id_match_is_case_sensitive() {
        let l = list(&["U123ABC"]);
        assert!(allowlist_matches(&l, "U123ABC", None));
        assert!(!allowlist_matches(&l, "u123abc", None));
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let l = list(&["Alice"]);
        assert!(allowlist_matches(&l, "U1", Some("alice")));
        assert!(allowlist_matches(&l, "U1", Some("ALICE")));
        assert!(!allowlist_matches(&l, "U1", Some("bob")));
    }

    #[test]
    fn wildcard_matches_any_peer() {
        let l = list(&["*"]);
        assert!(allowlist_matches(&l, "U1", None));
        assert!(allowlist_matches(&l, "whoever", Some("whoever")));
    }

    #[test]
    fn missing_name_only_matches_by_id() {
        let l = list(&["alice"]);
        assert!(!allowlist_matches(&l, "U1", None));
    }

    #[test]
    fn open_policy_without_allowlist_admits_any_channel() {
        assert!(channel_access_allowed(GroupPolicy::Open, false, false));
        assert!(channel_access_allowed(GroupPolicy::Open, false, true));
    }

    #[test]
    fn configured_allowlist_tightens_open_policy() {
        assert!(channel_access_allowed(GroupPolicy::Open, true, true));
        assert!(!channel_access_allowed(GroupPolicy::Open, true, false));
    }

    #[test]
    fn allowlist_policy_requires_configured_list() {
        assert!(!channel_access_allowed(GroupPolicy::Allowlist, false, true));
        assert!(channel_access_allowed(GroupPolicy::Allowlist, true, true));
        assert!(!channel_access_allowed(GroupPolicy::Allowlist, true, false));
    }

    #[test]
    fn disabled_policy_rejects_everything() {
        assert!(!channel_access_allowed(GroupPolicy::Disabled, false, true));
        assert!(!channel_access_allowed(GroupPolicy::Disabled, true, true));
    }
}
