use std::sync::{Arc, PoisonError, RwLock};

/// Single-slot holder for the current token string.
///
/// Clones share the same slot. Writes are last-writer-wins; callers that
/// need read-modify-write semantics must serialize access themselves.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    slot: Arc<RwLock<Option<String>>>,
}

impl TokenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        guard.take();
    }

    pub fn get(&self) -> Option<String> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    pub fn is_set(&self) -> bool {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        guard.is_some()
    }
}
