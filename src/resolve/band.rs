//! Category bands.
//!
//! `X0` and `X1` are reserved for engineering families. Every other family
//! is served `Y1` whatever it asks for; that is pay policy, not an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alias::{FamilyLookup, FamilyPolicy, ResolvedFamily};
use crate::types::Percentile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    X0,
    X1,
    Y1,
}

impl Band {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "X0" => Some(Band::X0),
            "X1" => Some(Band::X1),
            "Y1" => Some(Band::Y1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::X0 => "X0",
            Band::X1 => "X1",
            Band::Y1 => "Y1",
        }
    }

    /// Percentiles feeding (min, mid, max).
    pub fn triad(self) -> [Percentile; 3] {
        match self {
            Band::X0 => [Percentile::P62_5, Percentile::P75, Percentile::P90],
            Band::X1 => [Percentile::P50, Percentile::P62_5, Percentile::P75],
            Band::Y1 => [Percentile::P40, Percentile::P50, Percentile::P62_5],
        }
    }

    fn requires_engineering(self) -> bool {
        matches!(self, Band::X0 | Band::X1)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The band actually served to `family`.
pub fn effective_band(
    requested: Band,
    family: &ResolvedFamily,
    lookup: &FamilyLookup,
    policy: &FamilyPolicy,
) -> Band {
    if requested.requires_engineering() && !policy.is_engineering(family, lookup) {
        debug!(family = family.label(), band = %requested, "band downgraded to Y1");
        return Band::Y1;
    }
    requested
}
