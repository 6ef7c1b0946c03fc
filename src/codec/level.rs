//! Internal level strings: `L<n>[.5] (IC|Mgr)`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::normalize_code;

/// Levels at or above this base number resolve against executive tokens.
pub const EXECUTIVE_TIER: u32 = 7;

static LEVEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*L\s*(\d+)(\.5)?\s*(IC|MGR)\s*$").expect("Invalid level regex")
});

/// Individual contributor or manager track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    IC,
    Mgr,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::IC => "IC",
            Role::Mgr => "Mgr",
        }
    }
}

/// A parsed internal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Whole level number, always > 0. For `L6.5` this is 6.
    pub base: u32,
    /// Half level sitting between `base` and `base + 1`
    pub is_half: bool,
    pub role: Role,
}

impl LevelSpec {
    /// Parse a level string. Anything off-grammar is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = LEVEL_PATTERN.captures(raw)?;
        let base: u32 = caps.get(1)?.as_str().parse().ok()?;
        if base == 0 {
            return None;
        }
        let is_half = caps.get(2).is_some();
        // A half level needs a whole level above it
        if is_half && base.checked_add(1).is_none() {
            return None;
        }
        let role = if caps.get(3)?.as_str().eq_ignore_ascii_case("IC") {
            Role::IC
        } else {
            Role::Mgr
        };
        Some(Self { base, is_half, role })
    }

    pub fn whole(base: u32, role: Role) -> Self {
        Self {
            base,
            is_half: false,
            role,
        }
    }

    /// Numeric level, e.g. 6.5
    pub fn value(&self) -> f64 {
        self.base as f64 + if self.is_half { 0.5 } else { 0.0 }
    }

    /// Whole level at or below this one.
    pub fn floor(&self) -> Self {
        Self::whole(self.base, self.role)
    }

    /// Whole level above a half level (itself for whole levels).
    pub fn ceil(&self) -> Self {
        if self.is_half {
            Self::whole(self.base.saturating_add(1), self.role)
        } else {
            *self
        }
    }

    pub fn is_executive(&self) -> bool {
        self.base >= EXECUTIVE_TIER
    }
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_half {
            write!(f, "L{}.5 {}", self.base, self.role.as_str())
        } else {
            write!(f, "L{} {}", self.base, self.role.as_str())
        }
    }
}

/// Canonical form of a level string for keys: `L6.5 IC` when it parses,
/// otherwise the normalized raw text.
pub fn canonical_level(raw: &str) -> String {
    LevelSpec::parse(raw)
        .map(|spec| spec.to_string())
        .unwrap_or_else(|| normalize_code(raw))
}
