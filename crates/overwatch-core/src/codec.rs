//! YAML encoding of resource files
//!
//! Each file holds a YAML sequence of records of a single kind. The kind is
//! implied by the directory the file lives in, so records carry no tag.

use crate::resource::{Repository, Resource, ResourceKind, SERVICE_ACCOUNT_TYPE, ServiceAccount};
use crate::{Error, Result};

/// Decode one resource file of `kind`.
///
/// Empty files and `null` documents decode to no resources.
pub fn decode(kind: ResourceKind, bytes: &[u8]) -> std::result::Result<Vec<Resource>, serde_yaml::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match kind {
        ResourceKind::Repo => {
            let repos: Option<Vec<Repository>> = serde_yaml::from_slice(bytes)?;
            Ok(repos.unwrap_or_default().into_iter().map(Resource::Repo).collect())
        }
        ResourceKind::ServiceAccount => {
            let accounts: Option<Vec<ServiceAccount>> = serde_yaml::from_slice(bytes)?;
            Ok(accounts
                .unwrap_or_default()
                .into_iter()
                .map(|mut account| {
                    account.account_type = SERVICE_ACCOUNT_TYPE.to_string();
                    Resource::ServiceAccount(account)
                })
                .collect())
        }
    }
}

/// Encode every resource of `kind` in `resources`, sorted by name.
///
/// Resources of other kinds are skipped.
pub fn encode<'a>(kind: ResourceKind, resources: impl IntoIterator<Item = &'a Resource>) -> Result<String> {
    let mut selected: Vec<&Resource> = resources.into_iter().filter(|r| r.kind() == kind).collect();
    selected.sort_by(|a, b| a.name().cmp(b.name()));

    let encoded = match kind {
        ResourceKind::Repo => {
            let repos: Vec<&Repository> = selected
                .iter()
                .filter_map(|r| match r {
                    Resource::Repo(repo) => Some(repo),
                    _ => None,
                })
                .collect();
            serde_yaml::to_string(&repos)
        }
        ResourceKind::ServiceAccount => {
            let accounts: Vec<&ServiceAccount> = selected
                .iter()
                .filter_map(|r| match r {
                    Resource::ServiceAccount(account) => Some(account),
                    _ => None,
                })
                .collect();
            serde_yaml::to_string(&accounts)
        }
    };

    encoded.map_err(|e| Error::Encode {
        kind: kind.to_string(),
        message: e.to_string(),
    })
}
