//! Conversation message model

use crate::actions::ActionButton;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_SUGGESTED_REPLIES: usize = 3;
pub const MAX_ACTION_BUTTONS: usize = 6;

/// Prefix of the synthetic user message appended after an action dispatch
pub const AUDIT_PREFIX: &str = "✓ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Optional rich payload shown under a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.location.is_none() && self.activity.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_animating: bool,
    pub can_stop: bool,
    pub suggested_replies: Vec<String>,
    pub action_buttons: Vec<ActionButton>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attachments: Attachments,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
            is_animating: false,
            can_stop: false,
            suggested_replies: Vec::new(),
            action_buttons: Vec::new(),
            attachments: Attachments::default(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    pub fn audit(label: &str) -> Self {
        Self::user(format!("{AUDIT_PREFIX}{label}"))
    }

    /// Completed assistant message, used for greetings
    pub fn assistant(text: impl Into<String>, suggested_replies: Vec<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, text.into());
        msg.suggested_replies = cap(suggested_replies, MAX_SUGGESTED_REPLIES);
        msg
    }

    /// Empty assistant message about to be revealed
    pub fn streaming() -> Self {
        let mut msg = Self::new(Role::Assistant, String::new());
        msg.is_animating = true;
        msg.can_stop = true;
        msg
    }

    pub fn is_audit(&self) -> bool {
        self.role == Role::User && self.content.starts_with(AUDIT_PREFIX)
    }

    /// Move to the terminal state, attaching the pipeline's extras
    pub fn complete(
        &mut self,
        suggested_replies: Vec<String>,
        action_buttons: Vec<ActionButton>,
        attachments: Attachments,
    ) {
        self.is_animating = false;
        self.can_stop = false;
        self.suggested_replies = cap(suggested_replies, MAX_SUGGESTED_REPLIES);
        self.action_buttons = cap(action_buttons, MAX_ACTION_BUTTONS);
        self.attachments = attachments;
    }

    /// Freeze at the current prefix without attaching extras
    pub fn halt(&mut self) {
        self.is_animating = false;
        self.can_stop = false;
    }
}

fn cap<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;

    #[test]
    fn streaming_message_is_stoppable_until_terminal() {
        let mut msg = Message::streaming();
        assert!(msg.is_animating && msg.can_stop);

        let buttons = (0..9)
            .map(|id| ActionButton::new("v", Action::View { id }))
            .collect();
        let replies = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        msg.complete(replies, buttons, Attachments::default());

        assert!(!msg.is_animating && !msg.can_stop);
        assert_eq!(msg.suggested_replies.len(), MAX_SUGGESTED_REPLIES);
        assert_eq!(msg.action_buttons.len(), MAX_ACTION_BUTTONS);
    }

    #[test]
    fn audit_messages_are_recognized() {
        let msg = Message::audit("Book Pondok Bambu");
        assert_eq!(msg.content, "✓ Book Pondok Bambu");
        assert!(msg.is_audit());
        assert!(!Message::user("hello").is_audit());
    }
}
