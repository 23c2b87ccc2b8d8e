//! Manager configuration
//!
//! ```toml
//! RemoteLocator = "git@github.com:acme/iam-state.git"
//! TimeToLive = "10m"
//!
//! [ProviderOptions]
//! Project = "acme"
//! Synchro = "git"
//! Branch = "master"
//! SyncRemote = false
//! auth = { Type = "ssh", Key-Path = "/home/overwatch/.ssh/id_ed25519" }
//! ```
//!
//! Keys under `ProviderOptions` that are not recognised here are kept in
//! [`ProviderOptions::extra`] for the provider client.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use overwatch_fs::{ConfigStore, NormalizedPath};
use overwatch_git::{AuthDescriptor, DEFAULT_BRANCH, SynchroInfo};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest accepted time-to-live, one hundred years.
///
/// Keeps `now + TTL` representable for any realistic clock.
pub const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Top-level configuration for a [`Manager`](crate::Manager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Git URL or path of the desired-state repository
    #[serde(rename = "RemoteLocator", alias = "GitLocation")]
    pub remote_locator: String,

    /// Minimum time between two resyncs
    #[serde(rename = "TimeToLive", with = "ttl")]
    pub time_to_live: Duration,

    #[serde(rename = "ProviderOptions", default)]
    pub options: ProviderOptions,
}

/// Provider and synchro settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// Organisation or project the provider enumerates
    #[serde(rename = "Project", default)]
    pub project: String,

    /// Sync backend selector
    #[serde(rename = "Synchro", default)]
    pub synchro: String,

    #[serde(rename = "Branch", default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    /// Working copy location. Defaults to the remote locator.
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,

    #[serde(rename = "auth", default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthDescriptor>,

    /// Commit and push local changes on every sync
    #[serde(rename = "SyncRemote", default)]
    pub sync_remote: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Supported sync backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchroKind {
    Git,
}

impl FromStr for SynchroKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("git") {
            Ok(Self::Git)
        } else {
            Err(Error::UnsupportedSynchro {
                kind: s.to_string(),
            })
        }
    }
}

impl ManagerConfig {
    pub fn new(remote_locator: impl Into<String>, time_to_live: Duration, options: ProviderOptions) -> Self {
        Self {
            remote_locator: remote_locator.into(),
            time_to_live,
            options,
        }
    }

    /// Load a TOML, YAML or JSON configuration file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        tracing::debug!(path = %path, project = %config.options.project, "Loaded manager configuration");
        Ok(config)
    }

    /// Check required fields and the synchro selector.
    pub fn validate(&self) -> Result<SynchroKind> {
        if self.remote_locator.trim().is_empty() {
            return Err(Error::missing("RemoteLocator"));
        }
        if self.options.project.trim().is_empty() {
            return Err(Error::missing("ProviderOptions.Project"));
        }
        if self.options.synchro.trim().is_empty() {
            return Err(Error::missing("ProviderOptions.Synchro"));
        }
        self.ttl()?;
        self.options.synchro.parse()
    }

    pub fn project(&self) -> &str {
        self.options.project.trim()
    }

    /// TTL as a signed duration for clock arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimeToLive`] above [`MAX_TIME_TO_LIVE`].
    pub fn ttl(&self) -> Result<chrono::Duration> {
        let invalid = || Error::InvalidTimeToLive {
            value: ttl::format(self.time_to_live),
        };
        if self.time_to_live > MAX_TIME_TO_LIVE {
            return Err(invalid());
        }
        chrono::Duration::from_std(self.time_to_live).map_err(|_| invalid())
    }

    /// Settings for the git synchro.
    pub fn synchro_info(&self) -> SynchroInfo {
        let options = &self.options;
        let branch = if options.branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            options.branch.as_str()
        };
        let location = options
            .location
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.remote_locator));

        let mut info = SynchroInfo::new(&self.remote_locator)
            .with_branch(branch)
            .with_location(location)
            .with_sync_remote(options.sync_remote);
        if let Some(auth) = &options.auth {
            info = info.with_auth(auth.clone());
        }
        info
    }
}

/// Parse a TTL such as `90s`, `10m`, `2h`, `1d`, `1h30m`, `500ms` or a bare
/// number of seconds.
pub fn parse_ttl(input: &str) -> Result<Duration> {
    ttl::parse(input).ok_or_else(|| Error::InvalidTimeToLive {
        value: input.to_string(),
    })
}

/// Serde adapter for TTL values.
///
/// Integers are seconds; strings use unit suffixes.
pub mod ttl {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Repr::Text(text) => parse(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid time-to-live '{text}'"))),
        }
    }

    pub(crate) fn format(value: Duration) -> String {
        if value.subsec_millis() == 0 {
            format!("{}s", value.as_secs())
        } else {
            format!("{}ms", value.as_millis())
        }
    }

    pub(crate) fn parse(input: &str) -> Option<Duration> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Ok(secs) = input.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }

        let mut total_ms: u64 = 0;
        let mut rest = input;
        while !rest.is_empty() {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            let amount: u64 = rest[..digits].parse().ok()?;
            rest = &rest[digits..];

            let unit_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()).len();
            let factor: u64 = match &rest[..unit_len] {
                "ms" => 1,
                "s" => 1_000,
                "m" => 60_000,
                "h" => 3_600_000,
                "d" => 86_400_000,
                _ => return None,
            };
            rest = &rest[unit_len..];
            total_ms = total_ms.checked_add(amount.checked_mul(factor)?)?;
        }
        Some(Duration::from_millis(total_ms))
    }
}
