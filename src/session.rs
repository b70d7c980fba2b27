//! Session manager: owns the bearer token and derives the identity from it.
//!
//! States are Anonymous (no token) and Authenticated (token stored). `store`
//! moves to Authenticated, `clear` (logout or a 401 from the backend) moves
//! back. The identity is recomputed from the token on every call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::parse_identity;
use crate::error::ConsoleResult;
use crate::models::Identity;
use crate::storage::{MemoryTokenStore, Slot, TokenStore};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Persists `token`, replacing any previous one. No validation is done.
    pub fn store(&self, token: &str) -> ConsoleResult<()> {
        self.store.set(Slot::Token, token)?;
        debug!("session token stored");
        Ok(())
    }

    /// The stored token. A blank slot counts as no token.
    pub fn retrieve(&self) -> ConsoleResult<Option<String>> {
        Ok(self
            .store
            .get(Slot::Token)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Removes the token and the display name. Idempotent.
    pub fn clear(&self) -> ConsoleResult<()> {
        self.store.remove(Slot::Token)?;
        self.store.remove(Slot::DisplayName)?;
        debug!("session cleared");
        Ok(())
    }

    /// Identity from the current token. Missing, unreadable or malformed
    /// tokens all read as anonymous.
    pub fn identity(&self) -> Option<Identity> {
        let token = match self.retrieve() {
            Ok(token) => token?,
            Err(err) => {
                warn!(error = %err, "session storage unreadable; treating as anonymous");
                return None;
            }
        };
        let identity = parse_identity(&token);
        if identity.is_none() {
            debug!("stored token could not be decoded");
        }
        identity
    }

    pub fn display_name(&self) -> ConsoleResult<Option<String>> {
        self.store.get(Slot::DisplayName)
    }

    pub fn set_display_name(&self, name: &str) -> ConsoleResult<()> {
        self.store.set(Slot::DisplayName, name)
    }
}
