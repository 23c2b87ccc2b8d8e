//! Managed resources
//!
//! A resource is identified by `(kind, name)` and compared by value: two
//! resources are equal only when every attribute matches, so a changed
//! permission on an otherwise identical resource counts as drift.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of resource Overwatch knows how to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A source repository (GitHub)
    Repo,
    /// A service account (Google Cloud Platform)
    ServiceAccount,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Repo, ResourceKind::ServiceAccount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repo => "Repo",
            Self::ServiceAccount => "ServiceAccount",
        }
    }

    /// Directory holding this kind's files, e.g. `Repos`.
    pub fn directory_name(&self) -> String {
        format!("{}s", self.as_str())
    }

    /// File the kind is persisted to, e.g. `Repo.yml`.
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.as_str())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown resource kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(s) || kind.directory_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A repository and the access rules applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repository {
    pub name: String,
    /// Names of protected branches
    #[serde(default)]
    pub protected: Vec<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protected: Vec::new(),
            public: false,
            teams: Vec::new(),
        }
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn protect(mut self, branch: impl Into<String>) -> Self {
        self.protected.push(branch.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.teams.push(team.into());
        self
    }
}

/// Value of the `Type` attribute carried by every service account.
pub const SERVICE_ACCOUNT_TYPE: &str = "ServiceAccount";

fn service_account_type() -> String {
    SERVICE_ACCOUNT_TYPE.to_string()
}

/// A cloud service account. Its identity is the email, not the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Display name
    #[serde(rename = "Name")]
    pub display_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Type", default = "service_account_type")]
    pub account_type: String,
}

impl ServiceAccount {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
            account_type: service_account_type(),
        }
    }
}

/// One policy, rule or role applied to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedConfig {
    pub name: String,
    pub value: String,
}

impl fmt::Display for AppliedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Any managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "Kind")]
pub enum Resource {
    Repo(Repository),
    ServiceAccount(ServiceAccount),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Repo(_) => ResourceKind::Repo,
            Self::ServiceAccount(_) => ResourceKind::ServiceAccount,
        }
    }

    /// Identity within the resource's kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Repo(repo) => &repo.name,
            Self::ServiceAccount(account) => &account.email,
        }
    }

    /// Policies currently applied to the resource.
    pub fn applied_config(&self) -> Vec<AppliedConfig> {
        let entry = |name: &str, value: String| AppliedConfig {
            name: name.to_string(),
            value,
        };
        match self {
            Self::Repo(repo) => {
                let visibility = if repo.public { "public" } else { "private" };
                std::iter::once(entry("Visibility", visibility.to_string()))
                    .chain(repo.protected.iter().map(|b| entry("Protected", b.clone())))
                    .chain(repo.teams.iter().map(|t| entry("Team", t.clone())))
                    .collect()
            }
            Self::ServiceAccount(_) => Vec::new(),
        }
    }
}

impl From<Repository> for Resource {
    fn from(repo: Repository) -> Self {
        Self::Repo(repo)
    }
}

impl From<ServiceAccount> for Resource {
    fn from(account: ServiceAccount) -> Self {
        Self::ServiceAccount(account)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.name())
    }
}
