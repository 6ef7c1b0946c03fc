//! Caching layers.
//!
//! Two tiers:
//! - [`TtlCache`]: redb-backed key/value store with per-entry expiry. Values
//!   are bincode-serialized; an undecodable entry is simply a miss.
//! - [`LookupCache`]: an in-process slot for the family lookup map, which is
//!   read on every resolution and too hot for a store round trip.
//!
//! Keys are namespaced by the prefixes in [`keys`] so one clear-all pass can
//! address every concern.

mod clock;
pub mod keys;
mod lookup;
mod store;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use lookup::LookupCache;
pub use store::{CacheStats, TtlCache};

/// Default lifetime for every query cache, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 600;
