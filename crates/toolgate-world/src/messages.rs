//! Player-facing messages: localization keys plus arguments.
//!
//! The gating engine never formats copy. It emits a [`MessageKey`] and a
//! list of arguments; the host looks the key up in its language files.
//! [`MessageKey::fallback`] exists only so logs and the demo binary have
//! something readable to print.

use serde::{Deserialize, Serialize};
use toolgate_types::AgentId;

/// Stable localization keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    /// `{0}` cannot do `{1}`: no tool for `{2}`.
    MissingTool,
    /// `{0}` must drop tools before fetching another.
    DropToolsFirst,
    /// Menu label: `{0}` (will fetch `{1}`).
    WillFetch,
    /// No tool for `{0}` is reachable.
    NoToolReachable,
    /// `{0}` does not do `{1}` work.
    WorkTypeDisabled,
    /// `{0}` already has what `{1}` needs.
    AlreadySatisfied,
}

impl MessageKey {
    /// Localization key string.
    pub const fn key(self) -> &'static str {
        match self {
            Self::MissingTool => "Toolgate_MissingTool",
            Self::DropToolsFirst => "Toolgate_DropToolsFirst",
            Self::WillFetch => "Toolgate_WillFetch",
            Self::NoToolReachable => "Toolgate_NoToolReachable",
            Self::WorkTypeDisabled => "Toolgate_WorkTypeDisabled",
            Self::AlreadySatisfied => "Toolgate_AlreadySatisfied",
        }
    }

    /// English fallback template with positional `{n}` placeholders.
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::MissingTool => "{0} cannot {1}: needs a tool for {2}",
            Self::DropToolsFirst => "{0} must drop tools first",
            Self::WillFetch => "{0} (will fetch {1})",
            Self::NoToolReachable => "No tool for {0} within reach",
            Self::WorkTypeDisabled => "{0} does not do {1} work",
            Self::AlreadySatisfied => "{0} already has a tool for {1}",
        }
    }
}

/// A message plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Agent the message is about, if any.
    pub agent: Option<AgentId>,
    /// Localization key.
    pub key: MessageKey,
    /// Positional arguments.
    pub args: Vec<String>,
}

impl Message {
    /// Build a message about `agent`.
    pub fn about(agent: AgentId, key: MessageKey, args: Vec<String>) -> Self {
        Self {
            agent: Some(agent),
            key,
            args,
        }
    }

    /// Render the English fallback text.
    pub fn fallback_text(&self) -> String {
        render(self.key, &self.args)
    }
}

/// Substitute `{n}` placeholders in the fallback template of `key`.
pub fn render(key: MessageKey, args: &[String]) -> String {
    let mut text = String::from(key.fallback());
    for (i, arg) in args.iter().enumerate() {
        text = text.replace(&format!("{{{i}}}"), arg);
    }
    text
}

/// Sink for player-facing messages.
pub trait Messenger {
    /// Deliver a message.
    fn send(&mut self, message: Message);
}

/// Messenger that records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Messages received so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Take every recorded message.
    pub fn drain(&mut self) -> Vec<Message> {
        core::mem::take(&mut self.messages)
    }

    /// Number of recorded messages with `key`.
    pub fn count(&self, key: MessageKey) -> usize {
        self.messages.iter().filter(|m| m.key == key).count()
    }
}

impl Messenger for MessageLog {
    fn send(&mut self, message: Message) {
        tracing::debug!(key = message.key.key(), text = %message.fallback_text(), "message");
        self.messages.push(message);
    }
}
