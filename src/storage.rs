//! Client-side key-value slots for the session.
//!
//! Production uses a Sled tree under the console's state directory so the
//! token survives restarts; tests use the in-memory store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use sled::Db;

use crate::error::ConsoleResult;

/// The persisted slots. There is exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Bearer token issued at login.
    Token,
    /// Display name of the signed-in admin. Cosmetic only.
    DisplayName,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::Token => "token",
            Slot::DisplayName => "adminName",
        }
    }
}

/// Storage backend behind the session manager.
pub trait TokenStore: Send + Sync {
    fn get(&self, slot: Slot) -> ConsoleResult<Option<String>>;
    /// Replaces whatever the slot held.
    fn set(&self, slot: Slot, value: &str) -> ConsoleResult<()>;
    /// Removing an empty slot is a no-op.
    fn remove(&self, slot: Slot) -> ConsoleResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, slot: Slot) -> ConsoleResult<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(&slot).cloned())
    }

    fn set(&self, slot: Slot, value: &str) -> ConsoleResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot, value.to_owned());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> ConsoleResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&slot);
        Ok(())
    }
}

#[derive(Clone)] // Sled handles are cheap to clone and thread-safe
pub struct SledTokenStore {
    _db: Db,
    session_tree: sled::Tree,
}

impl SledTokenStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> ConsoleResult<Self> {
        let db = sled::open(path)?;
        let session_tree = db.open_tree("session")?;
        Ok(Self {
            _db: db,
            session_tree,
        })
    }
}

impl TokenStore for SledTokenStore {
    fn get(&self, slot: Slot) -> ConsoleResult<Option<String>> {
        Ok(self
            .session_tree
            .get(slot.key().as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set(&self, slot: Slot, value: &str) -> ConsoleResult<()> {
        self.session_tree.insert(slot.key().as_bytes(), value.as_bytes())?;
        self.session_tree.flush()?;
        Ok(())
    }

    fn remove(&self, slot: Slot) -> ConsoleResult<()> {
        self.session_tree.remove(slot.key().as_bytes())?;
        self.session_tree.flush()?;
        Ok(())
    }
}
