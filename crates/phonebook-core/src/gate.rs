//! Passphrase gate in front of the app.
//!
//! Plain comparison against a configured secret; the "authenticated" flag
//! lives in session storage so it survives restarts within one session.
//! This is not a security boundary.

use tracing::{info, warn};

use crate::error::GateError;
use crate::storage::SharedStorage;

pub const AUTH_KEY: &str = "phonebook_authed";

pub struct Gate {
    storage: SharedStorage,
    pass_phrase: String,
    open: bool,
}

impl Gate {
    pub fn new(storage: SharedStorage, pass_phrase: &str) -> Self {
        let open = storage.get(AUTH_KEY).as_deref() == Some("true");
        Self {
            storage,
            pass_phrase: pass_phrase.to_string(),
            open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Check a passphrase attempt. Input is trimmed before comparison.
    pub fn submit(&mut self, input: &str) -> Result<(), GateError> {
        if self.open {
            return Ok(());
        }

        let attempt = input.trim();
        if attempt.is_empty() {
            return Err(GateError::Empty);
        }
        if attempt != self.pass_phrase {
            return Err(GateError::Incorrect);
        }

        if let Err(e) = self.storage.set(AUTH_KEY, "true") {
            warn!(error = %e, "could not persist gate flag");
        }
        self.open = true;
        info!("gate opened");
        Ok(())
    }
}
