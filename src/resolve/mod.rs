//! Query-time resolution.
//!
//! - [`ScanResolver`]: strict top-to-bottom scan of one survey table, with
//!   alias fallback and half-level blending.
//! - [`Band`]: named band -> percentile triad, with the engineering gate.

mod band;
mod scan;

pub use band::{effective_band, Band};
pub use scan::ScanResolver;
