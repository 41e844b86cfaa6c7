//! In-process mirror used by tests and local development.
//!
//! Holds projections in two maps and exposes switches for simulating an
//! unreachable or flaky remote.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use cardbox_core::errors::SyncError;
use cardbox_core::traits::{MirrorPayload, RemoteMirror};

/// A mirror that stores projections in memory.
pub struct InMemoryMirror {
    cards: Mutex<HashMap<String, MirrorPayload>>,
    tags: Mutex<HashMap<String, MirrorPayload>>,
    online: AtomicBool,
    fail_next: AtomicU32,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self {
            cards: Mutex::new(HashMap::new()),
            tags: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            fail_next: AtomicU32::new(0),
        }
    }

    /// Simulate the remote going down or coming back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make the next `n` operations fail with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// The stored card projection, if any.
    pub fn card(&self, entity_id: &str) -> Option<MirrorPayload> {
        self.cards
            .lock()
            .ok()
            .and_then(|cards| cards.get(entity_id).cloned())
    }

    /// The stored tag projection, if any.
    pub fn tag(&self, entity_id: &str) -> Option<MirrorPayload> {
        self.tags
            .lock()
            .ok()
            .and_then(|tags| tags.get(entity_id).cloned())
    }

    pub fn card_count(&self) -> usize {
        self.cards.lock().map(|cards| cards.len()).unwrap_or(0)
    }

    fn gate(&self) -> Result<(), SyncError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable {
                reason: "mirror offline".to_string(),
            });
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(SyncError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn accept(
        map: &Mutex<HashMap<String, MirrorPayload>>,
        payload: &MirrorPayload,
    ) -> Result<(), SyncError> {
        if !payload.verify() {
            return Err(SyncError::ChecksumMismatch {
                entity_id: payload.entity_id.clone(),
                expected: payload.expected_checksum(),
                actual: payload.checksum.clone(),
            });
        }
        let mut guard = map.lock().map_err(|_| SyncError::Unavailable {
            reason: "mirror state poisoned".to_string(),
        })?;
        guard.insert(payload.entity_id.clone(), payload.clone());
        Ok(())
    }
}

impl Default for InMemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMirror for InMemoryMirror {
    fn can_sync(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn upsert_card(&self, payload: &MirrorPayload) -> Result<(), SyncError> {
        self.gate()?;
        Self::accept(&self.cards, payload)
    }

    fn upsert_tag(&self, payload: &MirrorPayload) -> Result<(), SyncError> {
        self.gate()?;
        Self::accept(&self.tags, payload)
    }

    fn delete_card(&self, entity_id: &str) -> Result<(), SyncError> {
        self.gate()?;
        let mut guard = self.cards.lock().map_err(|_| SyncError::Unavailable {
            reason: "mirror state poisoned".to_string(),
        })?;
        guard.remove(entity_id);
        Ok(())
    }
}
