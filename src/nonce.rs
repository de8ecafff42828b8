// src/nonce.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::Utc;

static SHARED: OnceLock<Arc<NonceCounter>> = OnceLock::new();

/// Strictly increasing nonce issuer.
///
/// The remote API rejects a request whose nonce is not greater than the last
/// one it accepted, so every value handed out is one above the previous,
/// regardless of which thread asks.
#[derive(Debug)]
pub struct NonceCounter {
    next: AtomicU64,
}

impl NonceCounter {
    /// Counter whose first issued value is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Counter seeded from the current Unix time in milliseconds.
    pub fn from_wall_clock() -> Self {
        Self::starting_at(Utc::now().timestamp_millis().max(0) as u64)
    }

    /// The process-wide counter, seeded on first use.
    pub fn shared() -> Arc<NonceCounter> {
        SHARED
            .get_or_init(|| Arc::new(Self::from_wall_clock()))
            .clone()
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
