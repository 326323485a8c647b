//! On-screen debug messages
//!
//! Transient text slots drawn over the viewport. A keyed post refreshes the
//! slot holding that key; an unkeyed post always takes a new slot.

use std::time::{Duration, Instant};

use blueprint_types::Color;
use parking_lot::Mutex;
use xxhash_rust::xxh64::xxh64;

/// Name value the graph uses for "no key"
pub const NO_KEY_NAME: &str = "None";

// ─────────────────────────────────────────────────────────────────────────────
// Message Key
// ─────────────────────────────────────────────────────────────────────────────

/// Slot key for an overlay message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Always add a new slot
    Unkeyed,
    /// Replace the slot with this key
    Keyed(u64),
}

impl MessageKey {
    /// Derive a key from a name pin. Absent, empty and "None" names are unkeyed.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.is_empty() && !n.eq_ignore_ascii_case(NO_KEY_NAME) => {
                MessageKey::Keyed(xxh64(n.as_bytes(), 0))
            }
            _ => MessageKey::Unkeyed,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlay Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for on-screen messages
pub trait OverlaySink: Send + Sync {
    fn add_message(&self, key: MessageKey, duration: Duration, color: Color, message: &str);
}

/// A visible overlay slot
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenMessage {
    pub key: MessageKey,
    pub text: String,
    pub color: Color,
    pub expires_at: Instant,
}

/// In-memory overlay keeping every live slot in post order
#[derive(Default)]
pub struct ScreenOverlay {
    slots: Mutex<Vec<ScreenMessage>>,
}

impl ScreenOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a message as of `now`
    pub fn post_at(
        &self,
        now: Instant,
        key: MessageKey,
        duration: Duration,
        color: Color,
        message: &str,
    ) {
        let expires_at = now.checked_add(duration).unwrap_or(now);
        let mut slots = self.slots.lock();

        if let MessageKey::Keyed(_) = key {
            if let Some(slot) = slots.iter_mut().find(|s| s.key == key) {
                slot.text = message.to_string();
                slot.color = color;
                slot.expires_at = expires_at;
                return;
            }
        }

        slots.push(ScreenMessage {
            key,
            text: message.to_string(),
            color,
            expires_at,
        });
    }

    /// Slots still visible at `now`
    pub fn visible(&self, now: Instant) -> Vec<ScreenMessage> {
        self.slots
            .lock()
            .iter()
            .filter(|s| s.expires_at >= now)
            .cloned()
            .collect()
    }

    /// Drop slots that expired before `now`, returning how many were removed
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|s| s.expires_at >= now);
        before - slots.len()
    }

    /// Number of slots held, expired or not
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl OverlaySink for ScreenOverlay {
    fn add_message(&self, key: MessageKey, duration: Duration, color: Color, message: &str) {
        self.post_at(Instant::now(), key, duration, color, message);
    }
}
