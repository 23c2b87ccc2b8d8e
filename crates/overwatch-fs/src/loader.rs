//! Resource file loader
//!
//! Reads every YAML file directly inside one directory and hands its bytes to
//! a caller-supplied decode function. The loader knows nothing about what a
//! resource is; it only concatenates what the decoder returns.

use std::fs;
use std::path::Path;

use crate::error::DecodeError;
use crate::{Error, NormalizedPath, Result, io};

const RESOURCE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Whether `path` names a resource file (`.yml`/`.yaml`, any case).
pub fn is_resource_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RESOURCE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Load and decode every resource file in `dir`.
///
/// Only immediate regular files are considered, visited in file-name order.
/// A missing directory, an unreadable file or a decode failure aborts the
/// whole load; no partial result is returned.
pub fn load<T, E, F>(dir: &NormalizedPath, mut decode: F) -> Result<Vec<T>>
where
    F: FnMut(&[u8]) -> std::result::Result<Vec<T>, E>,
    E: Into<DecodeError>,
{
    let native = dir.to_native();
    let metadata = fs::metadata(&native).map_err(|e| Error::io(&native, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path: native });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&native).map_err(|e| Error::io(&native, e))? {
        let entry = entry.map_err(|e| Error::io(&native, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_file() && is_resource_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut collection = Vec::new();
    for path in files {
        let bytes = io::read_bytes(&NormalizedPath::new(&path))?;
        let decoded = decode(&bytes).map_err(|e| Error::Decode {
            path: path.clone(),
            source: e.into(),
        })?;
        tracing::debug!(file = %path.display(), count = decoded.len(), "Decoded resource file");
        collection.extend(decoded);
    }

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("repos.yml", true)]
    #[case("repos.yaml", true)]
    #[case("Repos.YML", true)]
    #[case("accounts.Yaml", true)]
    #[case("notes.txt", false)]
    #[case("yml", false)]
    #[case("archive.yml.bak", false)]
    fn test_is_resource_file(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_resource_file(Path::new(name)), expected);
    }
}
