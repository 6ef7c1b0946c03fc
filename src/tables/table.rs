//! In-memory table snapshots: a header row followed by data rows.
//!
//! Tables arrive from collaborators (CSV exports, spreadsheets, tests) as
//! loosely-typed cells. Columns are located by header regex so both terse
//! (`P50`) and verbose (`CFY Fixed Pay: 50th Percentile`) survey exports work.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Percentile;

static EMPTY_CELL: Cell = Cell::Empty;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Cell from raw text as read from a CSV export. Whitespace-only is empty.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text, trimmed. Whole numbers render without a fraction.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.trim()),
            Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => Cow::Owned(format!("{:.0}", n)),
            Cell::Number(n) => Cow::Owned(n.to_string()),
            Cell::Bool(b) => Cow::Owned(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    /// Numeric value, if the cell holds one. Currency symbols, thousands
    /// separators and surrounding whitespace are tolerated in text cells;
    /// anything else that fails to parse is absent.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '£' | '€' | ' '))
                    .collect();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Truthiness for flag columns ("Active"): TRUE/YES/Y/1/ACTIVE.
    pub fn flag(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Number(n) => *n != 0.0,
            Cell::Text(s) => matches!(
                s.trim().to_ascii_uppercase().as_str(),
                "TRUE" | "YES" | "Y" | "1" | "ACTIVE"
            ),
            Cell::Empty => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        Cell::from_raw(raw)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A named table: `rows[0]` is the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a table from text rows (header first).
    pub fn from_text_rows<S: AsRef<str>>(name: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| Cell::from_raw(c.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn header(&self) -> &[Cell] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Data rows in table order (header excluded).
    pub fn data_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().skip(1).map(Vec::as_slice)
    }

    /// Index of the first header cell matching `pattern`.
    pub fn find_column(&self, pattern: &Regex) -> Option<usize> {
        self.header()
            .iter()
            .position(|cell| pattern.is_match(cell.text().as_ref()))
    }
}

/// Cell at `col`, or an empty cell for short rows.
pub fn cell_at(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&EMPTY_CELL)
}

/// Header patterns, all case-insensitive and anchored.
pub mod headers {
    use super::*;

    pub static JOB_CODE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*job\s*code\s*$").expect("Invalid job code header regex")
    });

    pub static JOB_FAMILY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*job\s*family\s*$").expect("Invalid job family header regex")
    });

    pub static FAMILY_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(job\s*family\s*(name|description)|description)\s*$")
            .expect("Invalid family description header regex")
    });

    pub static LEVEL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(internal\s*)?level\s*$").expect("Invalid level header regex")
    });

    pub static BENCHMARK_LEVEL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*((benchmark|survey)\s*(level|token|code)|token)\s*$")
            .expect("Invalid benchmark level header regex")
    });

    pub static ALIAS_FROM: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*from(\s*code)?\s*$").expect("Invalid alias from header regex")
    });

    pub static ALIAS_TO: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*to(\s*code)?\s*$").expect("Invalid alias to header regex")
    });

    pub static EXEC_CODE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(job\s*)?code\s*$").expect("Invalid exec code header regex")
    });

    pub static EXEC_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(exec(utive)?\s*(family|description)|description)\s*$")
            .expect("Invalid exec description header regex")
    });

    pub static SITE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*site\s*$").expect("Invalid site header regex")
    });

    pub static MAPPED_FAMILY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(exec(utive)?|mapped)\s*family\s*$")
            .expect("Invalid mapped family header regex")
    });

    pub static ACTIVE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(active|is\s*active)\s*$").expect("Invalid active header regex")
    });

    pub static PAY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(base\s*)?(pay|salary)(\s*amount)?\s*$").expect("Invalid pay header regex")
    });

    static P40: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(p\s*40|.*\b40(th)?\s*percentile)\s*$").expect("Invalid P40 header regex")
    });

    static P50: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(p\s*50|.*\b50(th)?\s*percentile)\s*$").expect("Invalid P50 header regex")
    });

    static P62_5: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(p\s*62\.5|.*\b62\.5(th)?\s*percentile)\s*$")
            .expect("Invalid P62.5 header regex")
    });

    static P75: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(p\s*75|.*\b75(th)?\s*percentile)\s*$").expect("Invalid P75 header regex")
    });

    static P90: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^\s*(p\s*90|.*\b90(th)?\s*percentile)\s*$").expect("Invalid P90 header regex")
    });

    /// Header pattern for a survey percentile column.
    pub fn percentile(p: Percentile) -> &'static Regex {
        match p {
            Percentile::P40 => &P40,
            Percentile::P50 => &P50,
            Percentile::P62_5 => &P62_5,
            Percentile::P75 => &P75,
            Percentile::P90 => &P90,
        }
    }
}
