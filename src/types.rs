//! Core types for payband - the compensation benchmark resolver.
//!
//! Key design decisions:
//! - `Option<f64>` is the Present/Absent sum type for every resolved number.
//!   A missing survey cell is `None`, never `0.0`.
//! - Values are plain data and `Serialize`, so they can live in the TTL cache.
//! - Codes and labels are normalized once at the edges (see [`normalize_code`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five survey percentiles tracked per benchmark row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Percentile {
    P40,
    P50,
    P62_5,
    P75,
    P90,
}

impl Percentile {
    pub const ALL: [Percentile; 5] = [
        Percentile::P40,
        Percentile::P50,
        Percentile::P62_5,
        Percentile::P75,
        Percentile::P90,
    ];

    /// Short label used in cache keys and exports ("P62.5").
    pub fn label(self) -> &'static str {
        match self {
            Percentile::P40 => "P40",
            Percentile::P50 => "P50",
            Percentile::P62_5 => "P62.5",
            Percentile::P75 => "P75",
            Percentile::P90 => "P90",
        }
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five-percentile tuple of one benchmark row (or of a blended half level).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p40: Option<f64>,
    pub p50: Option<f64>,
    pub p62_5: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
}

impl Percentiles {
    pub fn get(&self, p: Percentile) -> Option<f64> {
        match p {
            Percentile::P40 => self.p40,
            Percentile::P50 => self.p50,
            Percentile::P62_5 => self.p62_5,
            Percentile::P75 => self.p75,
            Percentile::P90 => self.p90,
        }
    }

    pub fn set(&mut self, p: Percentile, value: Option<f64>) {
        let slot = match p {
            Percentile::P40 => &mut self.p40,
            Percentile::P50 => &mut self.p50,
            Percentile::P62_5 => &mut self.p62_5,
            Percentile::P75 => &mut self.p75,
            Percentile::P90 => &mut self.p90,
        };
        *slot = value;
    }

    /// True when no component is present.
    pub fn is_empty(&self) -> bool {
        Percentile::ALL.iter().all(|p| self.get(*p).is_none())
    }

    /// Component-wise half-level blend. See [`midpoint`].
    pub fn blend(&self, other: &Percentiles) -> Percentiles {
        let mut out = Percentiles::default();
        for p in Percentile::ALL {
            out.set(p, midpoint(self.get(p), other.get(p)));
        }
        out
    }

    /// Round every present component to the nearest `step`.
    pub fn rounded(&self, step: f64) -> Percentiles {
        let mut out = *self;
        for p in Percentile::ALL {
            out.set(p, self.get(p).map(|v| round_to(v, step)));
        }
        out
    }
}

/// Average two optional values. A single present side is returned
/// unmodified; two absent sides stay absent.
pub fn midpoint(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some((x + y) / 2.0),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Round to the nearest multiple of `step` (half away from zero).
pub fn round_to(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// A resolved band: min / mid / max drawn from the band's percentile triad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<f64>,
    pub mid: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if at least one of min/mid/max resolved.
    pub fn is_present(&self) -> bool {
        self.min.is_some() || self.mid.is_some() || self.max.is_some()
    }
}

/// Order statistics over active internal pay records.
/// `count == 0` means no record matched; every other field is then `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalStats {
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl InternalStats {
    /// Compute count/min/median/max. Median of an even-sized set is the mean
    /// of the two middle values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Self {
            min: Some(sorted[0]),
            median: Some(median),
            max: Some(sorted[n - 1]),
            count: n,
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            min: self.min.map(f64::round),
            median: self.median.map(f64::round),
            max: self.max.map(f64::round),
            count: self.count,
        }
    }
}

/// Normalize a job code or family key: trimmed, inner whitespace collapsed,
/// uppercased. Every comparison between codes goes through this.
pub fn normalize_code(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
