//! Cache-busting token source.
//!
//! Tokens are wall-clock milliseconds, bumped past the previous token when
//! two renders of the same builder land in the same millisecond.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-builder token clock. Not shared between render passes.
#[derive(Debug, Clone, Default)]
pub struct BustClock {
    last: Cell<u64>,
}

impl BustClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next token as a decimal string.
    pub fn next_token(&self) -> String {
        self.next_at(now_millis()).to_string()
    }

    fn next_at(&self, now: u64) -> u64 {
        let token = now.max(self.last.get().saturating_add(1));
        self.last.set(token);
        token
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
