//! Server configuration from environment variables

use crate::format::DEFAULT_ASSET_ROOT;
use crate::state_machine::state::DEFAULT_DELIVERY_DELAY;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_AUTHOR: &str = "Sam";
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub port: u16,
    /// Pause before each bot message
    pub delivery_delay: Duration,
    /// Static asset root that image markers resolve under
    pub asset_root: String,
    /// Name used in the default conversation
    pub author: String,
    /// Directory served under `asset_root`, if any
    pub asset_dir: Option<PathBuf>,
    /// Sessions without visitor activity for this long are closed, zero
    /// keeps them until deleted
    pub session_ttl: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            delivery_delay: DEFAULT_DELIVERY_DELAY,
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            asset_dir: None,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORTFOLIO_PORT", defaults.port);
        let delivery_delay = Duration::from_millis(parse_or(
            &lookup,
            "PORTFOLIO_DELIVERY_DELAY_MS",
            u64::try_from(defaults.delivery_delay.as_millis()).unwrap_or(1000),
        ));
        let asset_root = lookup("PORTFOLIO_ASSET_ROOT")
            .filter(|v| !v.trim().is_empty())
            .filter(|v| {
                let routable = is_routable(v);
                if !routable {
                    tracing::warn!(
                        key = "PORTFOLIO_ASSET_ROOT",
                        value = %v,
                        default = %defaults.asset_root,
                        "Ignoring invalid config value"
                    );
                }
                routable
            })
            .unwrap_or(defaults.asset_root);
        let session_ttl = Duration::from_secs(parse_or(
            &lookup,
            "PORTFOLIO_SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        ));
        let author = lookup("PORTFOLIO_AUTHOR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.author);
        let asset_dir = lookup("PORTFOLIO_ASSET_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            port,
            delivery_delay,
            asset_root,
            author,
            asset_dir,
            session_ttl,
        }
    }
}

/// Local asset roots get mounted as a route, so they cannot carry route
/// captures or wildcards. Absolute URLs are only used as prefixes.
fn is_routable(asset_root: &str) -> bool {
    !asset_root.starts_with('/') || !asset_root.contains([':', '*'])
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Ignoring invalid config value");
            default
        }),
    }
}
