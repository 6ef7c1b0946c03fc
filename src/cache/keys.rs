//! Cache key namespaces.
//!
//! Composite keys join their parts with the ASCII unit separator. The
//! separator is stripped from every part first, so distinct part lists can
//! never produce the same key.

/// Raw table snapshots, keyed by table name.
pub const RAW: &str = "raw:";
/// Single percentile picks from the scan resolver.
pub const PICK: &str = "pick:";
/// Internal pay statistics results.
pub const STATS: &str = "stats:";
/// Parsed alias table.
pub const ALIAS: &str = "alias:";
/// Exec-description directory.
pub const EXEC: &str = "exec:";
/// The published benchmark index.
pub const INDEX: &str = "index:";

/// Every namespace the engine writes. Clear-all walks this list.
pub const ALL_PREFIXES: [&str; 6] = [RAW, PICK, STATS, ALIAS, EXEC, INDEX];

pub const SEPARATOR: char = '\u{1f}';

/// Join `parts` under `prefix`.
pub fn compose(prefix: &str, parts: &[&str]) -> String {
    let mut key = String::from(prefix);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.extend(part.chars().filter(|c| *c != SEPARATOR));
    }
    key
}
