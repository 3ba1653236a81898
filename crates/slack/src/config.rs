use std::collections::HashMap;

use {
    parlor_channels::gating::{DmPolicy, GroupPolicy},
    serde::{Deserialize, Serialize},
};

/// Configuration for a single Slack workspace account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackAccountConfig {
    /// Slash command name this account answers to, without the slash.
    pub command: String,

    /// DM access policy.
    pub dm_policy: DmPolicy,

    /// Access-group policy for channels. `None` disables group enforcement;
    /// the per-channel `allowed` flag still binds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_policy: Option<GroupPolicy>,

    /// Static DM sender allowlist, unioned with pairing-approved senders
    /// from the allow store.
    pub dm_allowlist: Vec<String>,

    /// Per-channel settings, keyed by channel ID, channel name, or `"*"`.
    pub channels: HashMap<String, ChannelOverride>,

    /// Account-wide fallback for `require_mention`. Unset means mentions are
    /// required, so the bot stays quiet in shared rooms unless addressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_require_mention: Option<bool>,
}

impl Default for SlackAccountConfig {
    fn default() -> Self {
        Self {
            command: "parlor".into(),
            dm_policy: DmPolicy::default(),
            group_policy: None,
            dm_allowlist: Vec::new(),
            channels: HashMap::new(),
            default_require_mention: None,
        }
    }
}

/// One per-channel configuration entry. Every field is optional; resolution
/// fills in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_mention: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<bool>,

    /// Per-channel user allowlist. `None` leaves the channel unrestricted;
    /// an empty list denies everyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

/// Effective settings for one channel, computed fresh per command. Never
/// cached: the account config may change between invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChannelConfig {
    pub allowed: bool,
    pub require_mention: bool,
    pub users: Option<Vec<String>>,
    pub system_prompt: Option<String>,
    pub skills: Option<Vec<String>>,
    /// Whether any configured entry matched, as opposed to pure defaults.
    /// The access gate reads this as "present in the channel allowlist".
    pub matched: bool,
}

/// Resolve the effective settings for one channel.
///
/// Lookup order: exact channel ID, exact channel name, `"*"` wildcard. Each
/// field then resolves through its own precedence chain; see the step
/// functions below.
pub fn resolve_channel_config(
    channel_id: &str,
    channel_name: Option<&str>,
    channels: &HashMap<String, ChannelOverride>,
    default_require_mention: Option<bool>,
) -> ResolvedChannelConfig {
    let entry = matched_override(channel_id, channel_name, channels);

    ResolvedChannelConfig {
        allowed: resolve_allowed(entry),
        require_mention: resolve_require_mention(entry, default_require_mention),
        users: entry.and_then(|e| e.users.clone()),
        system_prompt: entry.and_then(|e| e.system_prompt.clone()),
        skills: entry.and_then(|e| e.skills.clone()),
        matched: entry.is_some(),
    }
}

/// First matching entry: channel ID, then channel name, then wildcard.
fn matched_override<'a>(
    channel_id: &str,
    channel_name: Option<&str>,
    channels: &'a HashMap<String, ChannelOverride>,
) -> Option<&'a ChannelOverride> {
    channels
        .get(channel_id)
        .or_else(|| channel_name.and_then(|name| channels.get(name)))
        .or_else(|| channels.get("*"))
}

/// Mention requirement: the matched entry's explicit value, else the account
/// default, else required.
fn resolve_require_mention(entry: Option<&ChannelOverride>, account_default: Option<bool>) -> bool {
    entry
        .and_then(|e| e.require_mention)
        .or(account_default)
        .unwrap_or(true)
}

/// Channel permission: an explicit `allowed: false` denies; anything else
/// (absent entry included) allows.
fn resolve_allowed(entry: Option<&ChannelOverride>) -> bool {
    entry.and_then(|e| e.allowed).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn channels(entries: &[(&str, ChannelOverride)]) -> HashMap<String, ChannelOverride> {
        entries
            .iter()
            .map(|(key, entry)| (key.to_string(), entry.clone()))
            .collect()
    }

    #[test]
    fn unconfigured_channel_resolves_open_with_mentions_required() {
        let resolved = resolve_channel_config("C1", None, &HashMap::new(), None);
        assert!(resolved.allowed);
        assert!(resolved.require_mention);
        assert!(!resolved.matched);
        assert!(resolved.users.is_none());
    }

    #[rstest]
    // entry value, account default, expected
    #[case(None, None, true)]
    #[case(None, Some(false), false)]
    #[case(None, Some(true), true)]
    #[case(Some(true), Some(false), true)]
    #[case(Some(false), Some(true), false)]
    fn require_mention_precedence(
        #[case] entry_value: Option<bool>,
        #[case] account_default: Option<bool>,
        #[case] expected: bool,
    ) {
        let entry = entry_value.map(|v| ChannelOverride {
            require_mention: Some(v),
            ..Default::default()
        });
        assert_eq!(
            resolve_require_mention(entry.as_ref(), account_default),
            expected
        );
    }

    #[test]
    fn wildcard_entry_overrides_account_default() {
        let channels = channels(&[("*", ChannelOverride {
            require_mention: Some(true),
            ..Default::default()
        })]);
        let resolved = resolve_channel_config("C1", None, &channels, Some(false));
        assert!(resolved.require_mention);
        assert!(resolved.matched);
    }

    #[test]
    fn id_entry_beats_name_entry_beats_wildcard() {
        let channels = channels(&[
            ("C1", ChannelOverride {
                system_prompt: Some("by id".into()),
                ..Default::default()
            }),
            ("ops", ChannelOverride {
                system_prompt: Some("by name".into()),
                ..Default::default()
            }),
            ("*", ChannelOverride {
                system_prompt: Some("by wildcard".into()),
                ..Default::default()
            }),
        ]);

        let by_id = resolve_channel_config("C1", Some("ops"), &channels, None);
        assert_eq!(by_id.system_prompt.as_deref(), Some("by id"));

        let by_name = resolve_channel_config("C2", Some("ops"), &channels, None);
        assert_eq!(by_name.system_prompt.as_deref(), Some("by name"));

        let by_wildcard = resolve_channel_config("C3", Some("random"), &channels, None);
        assert_eq!(by_wildcard.system_prompt.as_deref(), Some("by wildcard"));
    }

    #[test]
    fn explicit_allowed_false_denies() {
        let channels = channels(&[("C1", ChannelOverride {
            allowed: Some(false),
            ..Default::default()
        })]);
        let resolved = resolve_channel_config("C1", None, &channels, None);
        assert!(!resolved.allowed);
        assert!(resolved.matched);
    }

    #[test]
    fn account_config_deserializes_with_defaults() {
        let config: SlackAccountConfig = serde_json::from_str(
            r#"{
                "dm_policy": "allowlist",
                "channels": {
                    "C9": {"allowed": false},
                    "*": {"require_mention": false, "skills": ["search"]}
                }
            }"#,
        )
        .expect("parse");

        assert_eq!(config.command, "parlor");
        assert_eq!(config.dm_policy, DmPolicy::Allowlist);
        assert!(config.group_policy.is_none());

        let denied = resolve_channel_config("C9", None, &config.channels, None);
        assert!(!denied.allowed);

        let open = resolve_channel_config("C1", None, &config.channels, None);
        assert!(open.allowed);
        assert!(!open.require_mention);
        assert_eq!(open.skills.as_deref(), Some(["search".to_string()].as_slice()));
    }
}
