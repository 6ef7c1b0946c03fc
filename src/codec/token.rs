//! Benchmark tokens and the row-matching rules built on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::level::{Role, EXECUTIVE_TIER};

/// Position of a survey row: letter prefix plus optional number (`P5`, `EA`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkToken {
    /// Leading letters, uppercased. Never empty.
    pub prefix: String,
    pub number: Option<u32>,
}

impl BenchmarkToken {
    /// Parse the segment after the last `.` of a job code.
    /// No leading letters means no token.
    pub fn parse(code: &str) -> Option<Self> {
        let segment = code.trim().rsplit('.').next()?.trim();

        let prefix: String = segment
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        if prefix.is_empty() {
            return None;
        }

        let digits: String = segment[prefix.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let number = digits.parse().ok();

        Some(Self { prefix, number })
    }

    pub fn letter(&self) -> char {
        self.prefix.chars().next().unwrap_or(' ')
    }
}

impl fmt::Display for BenchmarkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "{}{}", self.prefix, n),
            None => f.write_str(&self.prefix),
        }
    }
}

/// What a level asks of a survey row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenQuery {
    /// Internal level number; decides executive vs regular matching
    pub tier: u32,
    /// Preferred token letter from the level table (P, M, E, ...)
    pub letter: char,
    /// Token number from the level table
    pub number: Option<u32>,
    pub role: Role,
}

impl TokenQuery {
    pub fn is_executive(&self) -> bool {
        self.tier >= EXECUTIVE_TIER
    }

    /// Whether a survey row's token satisfies this query.
    ///
    /// Executive tiers match `E<n>` exactly, plus two fixed overrides:
    /// `EA` covers 3 and 4, `EB` covers 1 and 2. Regular tiers need the same
    /// letter and number; a Finance family on the IC track also accepts `F`
    /// where `P` is asked for.
    pub fn matches(&self, row: &BenchmarkToken, finance: bool) -> bool {
        let Some(number) = self.number else {
            return false;
        };

        if self.is_executive() {
            return match row.prefix.as_str() {
                "E" => row.number == Some(number),
                "EA" => matches!(number, 3 | 4),
                "EB" => matches!(number, 1 | 2),
                _ => false,
            };
        }

        if row.number != Some(number) {
            return false;
        }
        let letter = row.letter();
        if letter == self.letter {
            return true;
        }
        self.letter == 'P'
            && letter == 'F'
            && finance
            && self.role == Role::IC
            && self.tier < EXECUTIVE_TIER
    }
}
