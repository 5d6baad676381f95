//! Server configuration from environment variables
//!
//! Read once at startup. Unparsable numbers fall back to their defaults
//! rather than aborting the server.

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;
/// Hard ceiling on search results, whatever `SEARCH_MAX_LIMIT` says
pub const SEARCH_LIMIT_CEILING: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub default_search_limit: usize,
    pub max_search_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            port: DEFAULT_PORT,
            default_search_limit: DEFAULT_SEARCH_LIMIT,
            max_search_limit: SEARCH_LIMIT_CEILING,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup("DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let port = parse_or(&lookup, "PORT", defaults.port);
        let max_search_limit =
            parse_or(&lookup, "SEARCH_MAX_LIMIT", defaults.max_search_limit).clamp(1, SEARCH_LIMIT_CEILING);
        let default_search_limit =
            parse_or(&lookup, "SEARCH_DEFAULT_LIMIT", defaults.default_search_limit).clamp(1, max_search_limit);

        Self {
            data_dir,
            port,
            default_search_limit,
            max_search_limit,
        }
    }

    /// Resolve a raw `limit` query parameter.
    ///
    /// Missing or unparsable values use the default; everything is capped at
    /// the configured maximum.
    pub fn clamp_limit(&self, raw: Option<&str>) -> usize {
        raw.and_then(|r| r.trim().parse::<usize>().ok())
            .unwrap_or(self.default_search_limit)
            .min(self.max_search_limit)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
