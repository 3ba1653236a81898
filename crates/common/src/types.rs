use serde::{Deserialize, Serialize};

/// Kind of conversation surface a message or command arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// One-on-one direct message.
    Dm,
    /// Multi-party private group.
    Group,
    /// Named channel (public or private room).
    Channel,
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dm => write!(f, "dm"),
            Self::Group => write!(f, "group"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Kind of reply produced by an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// Final assistant text.
    Final,
    /// Intermediate tool-use output.
    Tool,
    /// Structured block content (code, attachments).
    Block,
}

/// A single reply payload produced by the dispatch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub kind: ReplyKind,
    pub text: String,
}
