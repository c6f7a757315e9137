//! Manifest building
//!
//! Turns a target file or directory into the list of URLs the device will fetch.

use crate::config::join_host_port;
use crate::error::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Extensions the homebrew loader can install (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".cia", ".tik", ".cetk", ".3dsx"];

/// Ordered, non-empty list of file URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    urls: Vec<String>,
}

impl Manifest {
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Newline-joined URL list, the text carried by the wire frame
    pub fn payload(&self) -> String {
        self.urls.join("\n")
    }
}

/// Check a file name against the accepted extension list
pub fn has_accepted_extension(file_name: &str) -> bool {
    let Some(idx) = file_name.rfind('.') else {
        return false;
    };
    let ext = &file_name[idx..];
    ACCEPTED_EXTENSIONS
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(ext))
}

/// Build the manifest for `target` and return it with the directory to serve.
///
/// A directory contributes its direct regular-file entries with an accepted
/// extension, sorted by name. A single file must itself be accepted and is
/// served from its parent directory.
pub fn build_manifest(
    target: &Path,
    host_ip: &str,
    host_port: u16,
) -> Result<(Manifest, PathBuf), ManifestError> {
    let authority = join_host_port(host_ip, host_port);
    let base = Url::parse(&format!("http://{}/", authority)).map_err(|_| {
        ManifestError::InvalidHost {
            host: host_ip.to_string(),
            port: host_port,
        }
    })?;

    let metadata = fs::metadata(target).map_err(|e| {
        tracing::debug!("Cannot stat {}: {}", target.display(), e);
        ManifestError::NoEligibleFiles {
            path: target.to_path_buf(),
        }
    })?;

    let (names, serving_dir) = if metadata.is_dir() {
        (eligible_entries(target)?, target.to_path_buf())
    } else {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| has_accepted_extension(n))
            .ok_or_else(|| ManifestError::UnsupportedExtension {
                path: target.to_path_buf(),
                accepted: ACCEPTED_EXTENSIONS.to_vec(),
            })?;
        (vec![name.to_string()], parent_dir(target))
    };

    if names.is_empty() {
        return Err(ManifestError::NoEligibleFiles {
            path: target.to_path_buf(),
        });
    }

    let urls = names
        .iter()
        .map(|name| file_url(&base, &authority, name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|()| ManifestError::InvalidHost {
            host: host_ip.to_string(),
            port: host_port,
        })?;

    tracing::debug!(
        "Manifest for {}: {} file(s) served from {}",
        target.display(),
        urls.len(),
        serving_dir.display()
    );

    Ok((Manifest { urls }, serving_dir))
}

/// Accepted regular files directly inside `dir`, sorted by name
fn eligible_entries(dir: &Path) -> Result<Vec<String>, ManifestError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        tracing::debug!("Cannot read directory {}: {}", dir.display(), e);
        ManifestError::NoEligibleFiles {
            path: dir.to_path_buf(),
        }
    })?;

    let mut names = Vec::new();
    for entry in entries.flatten() {
        // Follow symlinks so a link to a package counts as a file
        let is_file = fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if has_accepted_extension(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => tracing::warn!("Skipping non UTF-8 file name {:?}", raw),
        }
    }

    names.sort();
    Ok(names)
}

fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `host:port/<name>` with the name percent-encoded as one path segment
fn file_url(base: &Url, authority: &str, file_name: &str) -> Result<String, ()> {
    let mut url = base.clone();
    url.path_segments_mut()?.pop_if_empty().push(file_name);
    Ok(format!("{}{}", authority, url.path()))
}
