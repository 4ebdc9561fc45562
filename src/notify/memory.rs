//! In-memory messenger
//!
//! Keeps every delivered text in order. Useful when embedding the monitor in
//! another process that drains messages itself, and in tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::Messenger;

#[derive(Debug, Clone, Default)]
pub struct MemoryMessenger {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every text delivered so far
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every text delivered so far
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Messenger for MemoryMessenger {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }
}
