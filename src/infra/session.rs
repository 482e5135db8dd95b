//! In-memory session marker storage.

use std::sync::Mutex;

use crate::domain::SessionStore;

/// Session store holding the active provider id in process memory.
///
/// Stands in for the durable keyed storage a hosting surface would
/// provide (browser local storage, a config file).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    provider_id: Mutex<Option<String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, provider_id: &str) {
        *self.provider_id.lock().unwrap() = Some(provider_id.to_string());
    }

    fn clear(&self) {
        *self.provider_id.lock().unwrap() = None;
    }

    fn load(&self) -> Option<String> {
        self.provider_id.lock().unwrap().clone()
    }
}
