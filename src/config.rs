//! Configuration loading from payband.toml.
//!
//! ## Example
//!
//! ```toml
//! [tables]
//! levels = "Levels"
//! aliases = "Aliases"
//! exec-families = "Exec Families"
//! internal = "Internal Pay"
//!
//! [[regions]]
//! name = "US"
//! table = "Benchmarks US"
//! site = "USA"
//!
//! [cache]
//! ttl-secs = 600
//! dir = ".payband.cache"
//!
//! [policy]
//! engineering-prefixes = ["SWE", "ENG", "DATA"]
//! finance-prefixes = ["FIN", "ACC"]
//! default-alias = ["SDE", "SWE"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::DEFAULT_TTL_SECS;
use crate::types::normalize_code;

pub const CONFIG_FILE: &str = "payband.toml";

/// Family prefixes eligible for the X0/X1 bands when nothing is configured.
pub const DEFAULT_ENGINEERING_PREFIXES: &[&str] = &["SWE", "ENG", "DATA", "SEC", "SRE", "ML"];

/// Family prefixes classified as Finance when nothing is configured.
pub const DEFAULT_FINANCE_PREFIXES: &[&str] = &["FIN", "ACC"];

/// The built-in alias pair present regardless of the alias table.
pub const DEFAULT_ALIAS: (&str, &str) = ("SDE", "SWE");

/// Names of the shared input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub levels: String,
    pub aliases: String,
    pub exec_families: String,
    pub internal: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            levels: "Levels".to_string(),
            aliases: "Aliases".to_string(),
            exec_families: "Exec Families".to_string(),
            internal: "Internal Pay".to_string(),
        }
    }
}

/// One survey region and the payroll site it corresponds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub name: String,
    /// Benchmark table for this region
    pub table: String,
    /// Payroll site name; defaults to the region name
    pub site: String,
}

impl RegionConfig {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            site: name.to_string(),
        }
    }

    pub fn with_site(mut self, site: &str) -> Self {
        self.site = site.to_string();
        self
    }
}

/// payband configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,
    pub tables: TableNames,
    pub regions: Vec<RegionConfig>,
    pub ttl_secs: u64,
    /// Persistent cache directory; in-memory cache when `None`.
    pub cache_dir: Option<PathBuf>,
    pub engineering_prefixes: Vec<String>,
    pub finance_prefixes: Vec<String>,
    pub default_alias: (String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            tables: TableNames::default(),
            regions: Vec::new(),
            ttl_secs: DEFAULT_TTL_SECS,
            cache_dir: None,
            engineering_prefixes: DEFAULT_ENGINEERING_PREFIXES.iter().map(|s| s.to_string()).collect(),
            finance_prefixes: DEFAULT_FINANCE_PREFIXES.iter().map(|s| s.to_string()).collect(),
            default_alias: (DEFAULT_ALIAS.0.to_string(), DEFAULT_ALIAS.1.to_string()),
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    tables: Option<RawTables>,
    regions: Option<Vec<RawRegion>>,
    cache: Option<RawCache>,
    policy: Option<RawPolicy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawTables {
    levels: Option<String>,
    aliases: Option<String>,
    exec_families: Option<String>,
    internal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    name: String,
    table: Option<String>,
    site: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawCache {
    ttl_secs: Option<u64>,
    dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawPolicy {
    engineering_prefixes: Option<Vec<String>>,
    finance_prefixes: Option<Vec<String>>,
    default_alias: Option<(String, String)>,
}

impl Config {
    /// Load configuration for the given directory.
    ///
    /// Search order:
    /// 1. payband.toml in directory
    /// 2. Walk up to find payband.toml
    /// 3. Default config if nothing found
    pub fn load(directory: &Path) -> Self {
        let mut current = Some(directory.to_path_buf());
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                if let Some(config) = Self::load_file(&candidate) {
                    return config;
                }
            }
            current = dir.parent().map(Path::to_path_buf);
        }

        Self::default()
    }

    /// Load one config file. `None` if unreadable or malformed.
    pub fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(path.to_path_buf());
        // Relative cache dirs are relative to the config file
        if let (Some(dir), Some(parent)) = (config.cache_dir.as_ref(), path.parent()) {
            if dir.is_relative() {
                config.cache_dir = Some(parent.join(dir));
            }
        }
        Some(config)
    }

    pub fn from_toml(content: &str) -> Option<Self> {
        let raw: RawConfig = toml::from_str(content).ok()?;
        Some(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();
        let tables = raw.tables.unwrap_or_default();
        let cache = raw.cache.unwrap_or_default();
        let policy = raw.policy.unwrap_or_default();

        let regions = raw
            .regions
            .unwrap_or_default()
            .into_iter()
            .map(|r| RegionConfig {
                table: r.table.unwrap_or_else(|| format!("Benchmarks {}", r.name)),
                site: r.site.unwrap_or_else(|| r.name.clone()),
                name: r.name,
            })
            .collect();

        Self {
            source: None,
            tables: TableNames {
                levels: tables.levels.unwrap_or(defaults.tables.levels),
                aliases: tables.aliases.unwrap_or(defaults.tables.aliases),
                exec_families: tables.exec_families.unwrap_or(defaults.tables.exec_families),
                internal: tables.internal.unwrap_or(defaults.tables.internal),
            },
            regions,
            ttl_secs: cache.ttl_secs.unwrap_or(defaults.ttl_secs),
            cache_dir: cache.dir.map(PathBuf::from),
            engineering_prefixes: policy
                .engineering_prefixes
                .unwrap_or(defaults.engineering_prefixes),
            finance_prefixes: policy.finance_prefixes.unwrap_or(defaults.finance_prefixes),
            default_alias: policy.default_alias.unwrap_or(defaults.default_alias),
        }
    }

    /// Region by name, case-insensitive.
    pub fn region(&self, name: &str) -> Option<&RegionConfig> {
        let wanted = normalize_code(name);
        self.regions.iter().find(|r| normalize_code(&r.name) == wanted)
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        if self.regions.is_empty() {
            lines.push("   Regions: (none)".to_string());
        } else {
            let regions: Vec<_> = self
                .regions
                .iter()
                .map(|r| format!("{} [{}]", r.name, r.table))
                .collect();
            lines.push(format!("   Regions: {}", regions.join(", ")));
        }

        lines.push(format!("   Cache TTL: {}s", self.ttl_secs));
        if let Some(ref dir) = self.cache_dir {
            lines.push(format!("   Cache dir: {}", dir.display()));
        }

        lines.join("\n")
    }
}
