// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Scans ELF artifacts for unresolved `DT_NEEDED` entries and, in fix mode,
//! maps the missing sonames back to owning packages so the build pipeline
//! can re-drive them.

mod elf_scan;


pub use elf_scan::{needed_sonames, rpath_entries};

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::registry::Registry;

const DEFAULT_LIB_DIRS: &[&str] = &["/usr/lib", "/usr/lib64", "/lib", "/usr/lib32"];

/// A soname that some ELF file needs but that resolves to nothing on the
/// searched library directories.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingLibrary {
    pub soname: String,
    pub needed_by: Vec<PathBuf>,
}

pub struct Revdep<'a> {
    pub root: &'a Path,
    pub extra_lib_dirs: &'a [PathBuf],
}

impl<'a> Revdep<'a> {
    /// Walks every ELF executable/shared object under `root`, bounded to
    /// one device and skipping virtual filesystems, and reports sonames
    /// that fail to resolve.
    pub fn check(&self) -> Vec<MissingLibrary> {
        let mut missing: std::collections::BTreeMap<String, Vec<PathBuf>> = std::collections::BTreeMap::new();
        let root_dev = std::fs::metadata(self.root).ok().map(|m| device_id(&m));

        for entry in WalkDir::new(self.root).into_iter().filter_entry(|e| !is_virtual_fs(e.path())) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            if let (Some(root_dev), Ok(meta)) = (root_dev, entry.metadata()) {
                if device_id(&meta) != root_dev {
                    continue;
                }
            }

            let path = entry.path();
            let Ok(bytes) = std::fs::read(path) else { continue };
            if bytes.len() < 4 || &bytes[0..4] != b"\x7fELF" {
                continue;
            }

            let needed = needed_sonames(&bytes);
            let rpaths = rpath_entries(&bytes);

            for soname in needed {
                if !resolves(&soname, &rpaths, self.extra_lib_dirs) {
                    missing.entry(soname).or_default().push(path.to_path_buf());
                }
            }
        }

        missing
            .into_iter()
            .map(|(soname, needed_by)| MissingLibrary { soname, needed_by })
            .collect()
    }

    /// Maps each missing soname to a candidate owning package via registry
    /// manifests. Ties are broken lexicographically by registry key.
    pub fn owners(&self, missing: &[MissingLibrary], registry: &Registry) -> Result<Vec<(String, String)>, crate::registry::Error> {
        let manifests = registry.iter_manifests()?;
        let mut owners = Vec::new();

        for lib in missing {
            let mut candidates: Vec<&str> = manifests
                .iter()
                .filter(|(_, files)| files.iter().any(|f| basename(f) == lib.soname))
                .map(|(name, _)| name.as_str())
                .collect();
            candidates.sort_unstable();

            match candidates.first() {
                Some(owner) => owners.push((lib.soname.clone(), owner.to_string())),
                None => warn!(soname = %lib.soname, "no package owns a file matching this soname"),
            }
        }

        Ok(owners)
    }
}

fn resolves(soname: &str, rpaths: &[String], extra_lib_dirs: &[PathBuf]) -> bool {
    let search_dirs = rpaths
        .iter()
        .map(PathBuf::from)
        .chain(extra_lib_dirs.iter().cloned())
        .chain(DEFAULT_LIB_DIRS.iter().map(PathBuf::from));

    for dir in search_dirs {
        if dir.join(soname).exists() {
            return true;
        }
    }
    false
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_virtual_fs(path: &Path) -> bool {
    matches!(path.to_str(), Some(p) if p.starts_with("/proc") || p.starts_with("/sys") || p.starts_with("/dev"))
}

#[cfg(unix)]
fn device_id(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt as _;
    meta.dev()
}

#[cfg(not(unix))]
fn device_id(_meta: &std::fs::Metadata) -> u64 {
    0
}

pub fn log_summary(missing: &[MissingLibrary]) {
    if missing.is_empty() {
        info!("no missing shared libraries found");
    } else {
        for lib in missing {
            info!(soname = %lib.soname, count = lib.needed_by.len(), "missing library");
        }
    }
}
