// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Extracts a package archive onto the live root and records the
//! authoritative manifest - derived from the archive's table of contents,
//! never from a live-filesystem diff (see design notes on why the latter
//! is unsound).

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use chrono::Utc;
use fs_err as fs;
use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::info;
use xz2::read::XzDecoder;

use crate::registry::{Metadata, Registry};

pub struct Installer<'a> {
    pub registry: &'a Registry,
    pub root: &'a Path,
    pub jobs: usize,
    pub strip: bool,
}

impl<'a> Installer<'a> {
    /// Extracts `archive` onto `root`, derives the manifest from the
    /// archive's table of contents, and writes both registry records.
    pub fn install(
        &self,
        archive: &Path,
        name: &str,
        version: &str,
        recipe_path: &Path,
        toolchain: bool,
    ) -> Result<Vec<String>, Error> {
        let manifest = self.extract_and_list(archive)?;

        let metadata = Metadata {
            name: name.to_string(),
            version: version.to_string(),
            recipe_path: recipe_path.display().to_string(),
            built_at: Utc::now(),
            strip: self.strip,
            jobs: self.jobs,
            toolchain,
        };

        self.registry.put_metadata(&metadata)?;
        self.registry.put_manifest(name, manifest.clone())?;

        info!(name, count = manifest.len(), "installed");

        Ok(manifest)
    }

    fn extract_and_list(&self, archive: &Path) -> Result<Vec<String>, Error> {
        let name = archive.file_name().and_then(|s| s.to_str()).unwrap_or_default();

        let file = fs::File::open(archive)?;
        let manifest = if name.ends_with(".tar.xz") {
            self.unpack(tar::Archive::new(XzDecoder::new(file)))?
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            self.unpack(tar::Archive::new(GzDecoder::new(file)))?
        } else if name.ends_with(".tar.bz2") {
            self.unpack(tar::Archive::new(BzDecoder::new(file)))?
        } else if name.ends_with(".tar") {
            self.unpack(tar::Archive::new(file))?
        } else if name.ends_with(".xz") {
            vec![self.place_single_file(XzDecoder::new(file), name, ".xz")?]
        } else if name.ends_with(".gz") {
            vec![self.place_single_file(GzDecoder::new(file), name, ".gz")?]
        } else if name.ends_with(".bz2") {
            vec![self.place_single_file(BzDecoder::new(file), name, ".bz2")?]
        } else {
            return Err(Error::UnsupportedArchive(name.to_string()));
        };

        Ok(manifest)
    }

    /// A bare compressed package archive decompresses to a single regular
    /// file rather than a tree - it is placed directly under `root` named
    /// after the archive with the compression suffix stripped.
    fn place_single_file(&self, mut reader: impl std::io::Read, name: &str, suffix: &str) -> Result<String, Error> {
        let stripped = name.strip_suffix(suffix).unwrap_or(name);
        let dest = self.root.join(stripped);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest)?;
        std::io::copy(&mut reader, &mut out)?;
        Ok(to_absolute(Path::new(stripped)))
    }

    /// Extracts every entry onto `root` while recording the manifest from
    /// the same pass over the archive's table of contents - one read of
    /// the stream serves both purposes.
    fn unpack<R: std::io::Read>(&self, mut archive: tar::Archive<R>) -> Result<Vec<String>, Error> {
        let mut manifest = Vec::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let is_regular = entry.header().entry_type() == tar::EntryType::Regular;
            let path = entry.path()?.into_owned();

            entry.unpack_in(self.root)?;

            if is_regular {
                manifest.push(to_absolute(&path));
            }
        }

        Ok(manifest)
    }
}

fn to_absolute(path: &Path) -> String {
    let stripped = path.strip_prefix(".").unwrap_or(path);
    format!("/{}", stripped.to_string_lossy().trim_start_matches('/'))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("registry error")]
    Registry(#[from] crate::registry::Error),
    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),
}
