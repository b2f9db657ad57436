//! Optimistic append/replace reducer for a conversation view.
//!
//! A view never edits its message list directly. `submit` and `regenerate`
//! put a loader placeholder in the list and hand back a [`Ticket`]; once the
//! request finishes, `resolve` swaps the loader for the reply in the same slot.
//! Only one request may be pending at a time, so the list never holds more
//! than one loader.

use std::path::PathBuf;

use tracing::debug;

use crate::error::ApiError;
use crate::mode::Mode;
use crate::payload::Body;
use crate::state::{Message, MessageId, Sender};

/// Everything needed to issue one request against the API
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub mode: Mode,
    pub prompt: String,
    pub attachment: Option<PathBuf>,
}

/// Handle for a pending request: which loader to replace and what to send
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub loader_id: MessageId,
    pub request: Request,
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Option<MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted messages. Stray loaders have no request behind
    /// them anymore, so they are dropped.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into_iter().filter(|m| !m.is_loader()).collect(),
            pending: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Append the user's message and a loader, returning the request to run.
    ///
    /// Returns `None` (and changes nothing) when there is neither text nor an
    /// attachment, or when another request is still pending.
    pub fn submit(&mut self, input: &str, mode: Mode, attachment: Option<PathBuf>) -> Option<Ticket> {
        let text = input.trim();
        if text.is_empty() && attachment.is_none() {
            return None;
        }
        if self.is_pending() {
            debug!("submit ignored while a request is pending");
            return None;
        }

        self.messages
            .push(Message::user(text, mode, attachment.clone()));

        let loader = Message::loader();
        let loader_id = loader.id;
        self.messages.push(loader);
        self.pending = Some(loader_id);

        Some(Ticket {
            loader_id,
            request: Request {
                mode,
                prompt: text.to_string(),
                attachment,
            },
        })
    }

    /// Re-run the request behind the bot message at `index`, replacing it in
    /// place with a loader.
    ///
    /// The prompt comes from the message itself, or failing that from the
    /// nearest user message before it. Returns `None` if the slot isn't a bot
    /// message, nothing can be recovered, or a request is already pending.
    pub fn regenerate(&mut self, index: usize) -> Option<Ticket> {
        if self.is_pending() {
            return None;
        }
        let target = self.messages.get(index)?;
        if target.sender != Sender::Bot {
            return None;
        }

        let request = self.recover_request(index)?;
        let loader = Message::loader();
        let loader_id = loader.id;
        self.messages[index] = loader;
        self.pending = Some(loader_id);

        Some(Ticket { loader_id, request })
    }

    fn recover_request(&self, index: usize) -> Option<Request> {
        let target = &self.messages[index];
        let preceding_user = self.messages[..index]
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User);

        let prompt = target
            .prompt
            .clone()
            .or_else(|| preceding_user.map(|m| m.text.clone()));
        let attachment = target
            .attachment
            .clone()
            .or_else(|| preceding_user.and_then(|m| m.attachment.clone()));

        let prompt = match prompt {
            Some(p) if !p.trim().is_empty() => p,
            _ if attachment.is_some() => String::new(),
            _ => return None,
        };
        let mode = target
            .mode
            .or_else(|| preceding_user.and_then(|m| m.mode))
            .unwrap_or_default();

        Some(Request {
            mode,
            prompt,
            attachment,
        })
    }

    /// Replace the ticket's loader with the outcome of its request.
    ///
    /// Returns `false` when the loader is gone (e.g. the conversation was
    /// cleared meanwhile); the outcome is then dropped.
    pub fn resolve(&mut self, ticket: Ticket, outcome: Result<Body, ApiError>) -> bool {
        if self.pending == Some(ticket.loader_id) {
            self.pending = None;
        }

        let Some(pos) = self.messages.iter().position(|m| m.id == ticket.loader_id) else {
            debug!(loader = %ticket.loader_id, "dropping response for a loader that no longer exists");
            return false;
        };

        let Request {
            mode,
            prompt,
            attachment,
        } = ticket.request;
        self.messages[pos] = match outcome {
            Ok(body) => Message::bot(body, &prompt, attachment),
            Err(err) => Message::failure(&err.to_string(), mode, &prompt, attachment),
        };
        true
    }

    /// Drop every message, including any pending loader
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending = None;
    }
}
