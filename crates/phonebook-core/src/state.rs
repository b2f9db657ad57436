//! UI-agnostic message types
//!
//! These are shared by every conversation view and are the unit that the
//! session cache persists.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::truncate_chars;
use crate::mode::Mode;
use crate::payload::Body;

pub type MessageId = Uuid;

/// Longest `text` kept when a message is persisted
pub const TEXT_LIMIT: usize = 4000;

/// Who a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    /// Placeholder for an in-flight request
    Loader,
}

/// A single entry in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    /// Query that produced this message, kept for regenerate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Message {
    pub fn user(text: &str, mode: Mode, attachment: Option<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: text.to_string(),
            mode: Some(mode),
            body: None,
            prompt: None,
            attachment,
            error: false,
        }
    }

    pub fn loader() -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Loader,
            text: String::new(),
            mode: None,
            body: None,
            prompt: None,
            attachment: None,
            error: false,
        }
    }

    /// Successful bot reply; `text` holds the pretty-printed payload
    pub fn bot(body: Body, prompt: &str, attachment: Option<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: body.to_pretty_json(),
            mode: Some(body.mode()),
            body: Some(body),
            prompt: Some(prompt.to_string()),
            attachment,
            error: false,
        }
    }

    /// Bot reply standing in for a failed request
    pub fn failure(detail: &str, mode: Mode, prompt: &str, attachment: Option<PathBuf>) -> Self {
        let detail = if detail.trim().is_empty() {
            "request failed"
        } else {
            detail
        };
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: format!("Error: {}", detail),
            mode: Some(mode),
            body: None,
            prompt: Some(prompt.to_string()),
            attachment,
            error: true,
        }
    }

    pub fn is_loader(&self) -> bool {
        self.sender == Sender::Loader
    }

    /// Size-bounded copy for session storage
    pub fn trimmed(&self) -> Self {
        Self {
            text: truncate_chars(&self.text, TEXT_LIMIT),
            body: self.body.as_ref().map(Body::trimmed),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::CompanyProfile;

    #[test]
    fn test_bot_message_carries_mode_and_prompt() {
        let body = Body::Company(CompanyProfile {
            name: "Acme".into(),
            ..Default::default()
        });
        let msg = Message::bot(body, "acme", None);

        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.mode, Some(Mode::Company));
        assert_eq!(msg.prompt.as_deref(), Some("acme"));
        assert!(msg.text.contains("\"name\": \"Acme\""));
        assert!(!msg.error);
    }

    #[test]
    fn test_failure_text_is_never_blank() {
        let msg = Message::failure("", Mode::News, "solar", None);
        assert_eq!(msg.text, "Error: request failed");
        assert!(msg.error);
        assert_eq!(msg.mode, Some(Mode::News));
    }

    #[test]
    fn test_trimmed_cuts_long_text() {
        let msg = Message::user(&"x".repeat(5000), Mode::Company, None);
        assert_eq!(msg.trimmed().text.len(), TEXT_LIMIT);
        assert_eq!(msg.trimmed().id, msg.id);
    }

    #[test]
    fn test_serialized_form_omits_empty_fields() {
        let msg = Message::user("hello", Mode::Company, None);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["sender"], "user");
        assert!(value.get("body").is_none());
        assert!(value.get("error").is_none());
    }
}
