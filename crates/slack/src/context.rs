//! Routed-context assembly: channel description, system prompt, peer kind.

use parlor_common::types::ChatType;

/// Channel description assembled from topic and purpose: trimmed,
/// deduplicated, newline-joined.
pub fn channel_description(topic: Option<&str>, purpose: Option<&str>) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in [topic, purpose].into_iter().flatten() {
        let part = part.trim();
        if !part.is_empty() && !parts.contains(&part) {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// System prompt for a command run: channel description first, the
/// configured prompt after, separated by a blank line.
pub fn compose_system_prompt(
    description: Option<&str>,
    configured: Option<&str>,
) -> Option<String> {
    let parts: Vec<&str> = [description, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Surface kind for a channel. The directory's word wins when it has one;
/// otherwise Slack ID prefixes decide (D = direct, G = group).
pub fn peer_kind(channel_id: &str, directory_kind: Option<ChatType>) -> ChatType {
    directory_kind.unwrap_or(match channel_id.chars().next() {
        Some('D') => ChatType::Dm,
        Some('G') => ChatType::Group,
        _ => ChatType::Channel,
    })
}
