//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Numeric tunables fall back to their
//! defaults when unparsable; a malformed listen address, join mode or role
//! table fails startup.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::{RoleId, StoreLimits, Tier};

/// Error raised when a configuration value cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but malformed.
    #[error("invalid {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// How the join button behaves for a member who is already listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Pressing join again leaves the roster.
    #[default]
    Toggle,
    /// Join only adds; leaving requires an operator removal.
    AddOnly,
}

impl std::str::FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" => Ok(Self::Toggle),
            "add_only" | "add-only" => Ok(Self::AddOnly),
            other => Err(format!("unknown join mode '{other}'")),
        }
    }
}

/// Role-to-tier table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierRoles {
    entries: Vec<(Tier, RoleId)>,
}

impl TierRoles {
    /// Builds a table from `(tier, role)` pairs.
    #[must_use]
    pub fn new(mut entries: Vec<(Tier, RoleId)>) -> Self {
        entries.sort_by_key(|(tier, _)| *tier);
        Self { entries }
    }

    /// Parses `1:<role>,2:<role>,3:<role>`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed entry.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut entries = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((tier, role)) = part.split_once(':') else {
                return Err(format!("'{part}' is not <tier>:<role>"));
            };
            let tier = tier
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(Tier::new)
                .ok_or_else(|| format!("'{tier}' is not a tier between 1 and {}", Tier::MAX))?;
            let role = role
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("'{role}' is not a role id"))?;
            entries.push((tier, RoleId::new(role)));
        }
        Ok(Self::new(entries))
    }

    /// Resolves a member's tier. When several tier roles match, the lowest
    /// tier number wins.
    #[must_use]
    pub fn resolve(&self, roles: &[RoleId]) -> Option<Tier> {
        self.entries
            .iter()
            .find(|(_, role)| roles.contains(role))
            .map(|(tier, _)| *tier)
    }

    /// Returns `true` if no tier role is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`VzpConfig::from_env`].
#[derive(Debug, Clone)]
pub struct VzpConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Directory holding `vzp_data.json` and `swap_data.json`.
    pub data_dir: std::path::PathBuf,

    /// Store caps.
    pub limits: StoreLimits,

    /// Join button behavior.
    pub join_policy: JoinPolicy,

    /// Role-to-tier table.
    pub tier_roles: TierRoles,

    /// Roles allowed to run operator commands.
    pub admin_roles: Vec<RoleId>,

    /// Delay between two direct messages.
    pub notify_pacing: Duration,

    /// Number of `@everyone` pings after the ping headline.
    pub ping_repeat: u32,

    /// Delay between two pings.
    pub ping_interval: Duration,

    /// Headline posted before the pings.
    pub ping_message: String,

    /// Archive entries older than this many days are pruned by cleanup.
    pub archive_retention_days: i64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// How long a platform request waits for the adapter's acknowledgement.
    pub adapter_timeout: Duration,

    /// Shared secret the adapter must present when registering. Any
    /// connection may register when unset.
    pub adapter_token: Option<String>,
}

impl Default for VzpConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_dir: std::path::PathBuf::from("."),
            limits: StoreLimits::default(),
            join_policy: JoinPolicy::default(),
            tier_roles: TierRoles::default(),
            admin_roles: Vec::new(),
            notify_pacing: Duration::from_millis(100),
            ping_repeat: 3,
            ping_interval: Duration::from_millis(300),
            ping_message: DEFAULT_PING_MESSAGE.to_string(),
            archive_retention_days: 7,
            event_bus_capacity: 10_000,
            adapter_timeout: Duration::from_secs(5),
            adapter_token: None,
        }
    }
}

const DEFAULT_PING_MESSAGE: &str = "**EVERYONE TO THE TERRITORY!**";

impl VzpConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR`, `JOIN_MODE`,
    /// `TIER_ROLES` or `ADMIN_ROLES` is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("LISTEN_ADDR", format!("{e}")))?,
            None => defaults.listen_addr,
        };

        let join_policy = match lookup("JOIN_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("JOIN_MODE", e))?,
            None => defaults.join_policy,
        };

        let tier_roles = match lookup("TIER_ROLES") {
            Some(raw) => {
                TierRoles::parse(&raw).map_err(|e| ConfigError::invalid("TIER_ROLES", e))?
            }
            None => defaults.tier_roles,
        };

        let admin_roles = match lookup("ADMIN_ROLES") {
            Some(raw) => parse_role_list(&raw).map_err(|e| ConfigError::invalid("ADMIN_ROLES", e))?,
            None => defaults.admin_roles,
        };

        let limits = StoreLimits {
            max_active: parse_or(&lookup, "MAX_ACTIVE_VZP", defaults.limits.max_active),
            max_participants: parse_or(
                &lookup,
                "MAX_PARTICIPANTS_PER_VZP",
                defaults.limits.max_participants,
            ),
        };

        Ok(Self {
            listen_addr,
            data_dir: lookup("DATA_DIR").map_or(defaults.data_dir, std::path::PathBuf::from),
            limits,
            join_policy,
            tier_roles,
            admin_roles,
            notify_pacing: Duration::from_millis(parse_or(&lookup, "NOTIFY_PACING_MS", 100)),
            ping_repeat: parse_or(&lookup, "PING_REPEAT", defaults.ping_repeat),
            ping_interval: Duration::from_millis(parse_or(&lookup, "PING_INTERVAL_MS", 300)),
            ping_message: lookup("PING_MESSAGE")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.ping_message),
            archive_retention_days: parse_or(
                &lookup,
                "ARCHIVE_RETENTION_DAYS",
                defaults.archive_retention_days,
            ),
            event_bus_capacity: parse_or(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            adapter_timeout: Duration::from_millis(parse_or(&lookup, "ADAPTER_TIMEOUT_MS", 5_000)),
            adapter_token: lookup("ADAPTER_TOKEN").filter(|t| !t.trim().is_empty()),
        })
    }

    /// Returns `true` if any of `roles` is an admin role.
    #[must_use]
    pub fn is_admin(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|r| self.admin_roles.contains(r))
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_role_list(raw: &str) -> Result<Vec<RoleId>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u64>()
                .map(RoleId::new)
                .map_err(|_| format!("'{p}' is not a role id"))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let Ok(cfg) = VzpConfig::from_lookup(lookup(&[])) else {
            panic!("defaults should load");
        };
        assert_eq!(cfg.limits.max_active, 15);
        assert_eq!(cfg.limits.max_participants, 100);
        assert_eq!(cfg.join_policy, JoinPolicy::Toggle);
        assert_eq!(cfg.notify_pacing, Duration::from_millis(100));
        assert_eq!(cfg.ping_repeat, 3);
        assert_eq!(cfg.archive_retention_days, 7);
        assert_eq!(cfg.adapter_timeout, Duration::from_secs(5));
        assert_eq!(cfg.adapter_token, None);
    }

    #[test]
    fn adapter_settings() {
        let Ok(cfg) = VzpConfig::from_lookup(lookup(&[
            ("ADAPTER_TIMEOUT_MS", "250"),
            ("ADAPTER_TOKEN", "s3cret"),
        ])) else {
            panic!("adapter settings should load");
        };
        assert_eq!(cfg.adapter_timeout, Duration::from_millis(250));
        assert_eq!(cfg.adapter_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn reads_overrides() {
        let Ok(cfg) = VzpConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "127.0.0.1:8080"),
            ("JOIN_MODE", "add_only"),
            ("TIER_ROLES", "1:100, 2:200,3:300"),
            ("ADMIN_ROLES", "900,901"),
            ("MAX_ACTIVE_VZP", "4"),
            ("PING_REPEAT", "5"),
        ])) else {
            panic!("overrides should load");
        };
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.join_policy, JoinPolicy::AddOnly);
        assert_eq!(cfg.admin_roles, vec![RoleId::new(900), RoleId::new(901)]);
        assert_eq!(cfg.limits.max_active, 4);
        assert_eq!(cfg.ping_repeat, 5);
        assert!(cfg.is_admin(&[RoleId::new(1), RoleId::new(901)]));
        assert!(!cfg.is_admin(&[RoleId::new(100)]));
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let Ok(cfg) = VzpConfig::from_lookup(lookup(&[("MAX_ACTIVE_VZP", "lots")])) else {
            panic!("numeric fallback should load");
        };
        assert_eq!(cfg.limits.max_active, 15);
    }

    #[test]
    fn malformed_join_mode_fails() {
        let result = VzpConfig::from_lookup(lookup(&[("JOIN_MODE", "sometimes")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "JOIN_MODE",
                ..
            })
        ));
    }

    #[test]
    fn malformed_tier_roles_fail() {
        for raw in ["4:100", "1-100", "1:abc"] {
            let result = VzpConfig::from_lookup(lookup(&[("TIER_ROLES", raw)]));
            assert!(result.is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn lowest_tier_wins() {
        let Ok(table) = TierRoles::parse("3:30,1:10,2:20") else {
            panic!("table should parse");
        };
        assert_eq!(
            table.resolve(&[RoleId::new(30), RoleId::new(20)]),
            Tier::new(2)
        );
        assert_eq!(table.resolve(&[RoleId::new(10), RoleId::new(30)]), Tier::new(1));
        assert_eq!(table.resolve(&[RoleId::new(99)]), None);
    }
}
