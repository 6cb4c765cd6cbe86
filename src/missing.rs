//! Process-wide switch between lenient and strict missing-key lookups.
//!
//! Lenient (the default): reading an unknown key yields [`Value::Nil`](crate::Value::Nil).
//! Strict: reading an unknown key fails with [`Error::MissingKey`](crate::Error::MissingKey).
//! Presence queries are always lenient.
//!
//! The switch is shared by every node in the process and may be flipped at any time.

use std::sync::atomic::{AtomicBool, Ordering};

static RAISE_MISSING_KEYS: AtomicBool = AtomicBool::new(false);

/// Returns whether missing-key reads currently fail.
pub fn raise_missing_keys() -> bool {
    RAISE_MISSING_KEYS.load(Ordering::Relaxed)
}

/// Switches missing-key reads between lenient (`false`) and strict (`true`).
pub fn set_raise_missing_keys(raise: bool) {
    tracing::debug!(raise, "raise_missing_keys changed");
    RAISE_MISSING_KEYS.store(raise, Ordering::Relaxed);
}
