//! Long-lived in-process cache slot.
//!
//! Holds one value plus the time it was built. Readers load an `Arc`
//! snapshot; a refresh swaps in a whole new snapshot, so nobody ever sees a
//! half-built value.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

use super::clock::Clock;

struct Stamped<T> {
    value: Arc<T>,
    refreshed_at: u64,
}

/// Lazily refreshed value with a TTL.
pub struct LookupCache<T> {
    slot: ArcSwapOption<Stamped<T>>,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl<T> LookupCache<T> {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            ttl_secs,
            clock,
        }
    }

    /// Current value if still fresh.
    pub fn peek(&self) -> Option<Arc<T>> {
        let now = self.clock.now_secs();
        self.slot
            .load_full()
            .filter(|s| now < s.refreshed_at.saturating_add(self.ttl_secs))
            .map(|s| s.value.clone())
    }

    /// Fresh value, rebuilding with `refresh` when empty or stale.
    /// A failed refresh leaves the previous snapshot in place.
    pub fn get_or_refresh<E>(&self, refresh: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(value) = self.peek() {
            return Ok(value);
        }

        debug!("lookup cache stale, refreshing");
        let value = Arc::new(refresh()?);
        self.publish(value.clone());
        Ok(value)
    }

    /// Replace the snapshot with a value built elsewhere.
    pub fn publish(&self, value: Arc<T>) {
        self.slot.store(Some(Arc::new(Stamped {
            value,
            refreshed_at: self.clock.now_secs(),
        })));
    }

    /// Drop the snapshot; the next access refreshes.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }
}
