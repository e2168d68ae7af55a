// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Two flat files per installed package: `{name}.META` (key=value metadata)
//! and `{name}.files` (sorted, newline-separated absolute paths). No SQL
//! database - the registry directory itself is the source of truth.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use itertools::Itertools as _;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    pub recipe_path: String,
    pub built_at: DateTime<Utc>,
    pub strip: bool,
    pub jobs: usize,
    /// Purely organizational - whether the recipe's own `toolchain` flag
    /// was set, carried through unchanged from the recipe.
    pub toolchain: bool,
}

impl Metadata {
    fn to_lines(&self) -> String {
        format!(
            "name={}\nversion={}\nrecipe_path={}\nbuilt_at={}\nstrip={}\njobs={}\ntoolchain={}\n",
            self.name,
            self.version,
            self.recipe_path,
            self.built_at.to_rfc3339(),
            self.strip,
            self.jobs,
            self.toolchain
        )
    }

    fn from_lines(text: &str) -> Result<Self, Error> {
        let mut name = None;
        let mut version = None;
        let mut recipe_path = None;
        let mut built_at = None;
        let mut strip = None;
        let mut jobs = None;
        let mut toolchain = false;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else { continue };
            match key {
                "name" => name = Some(value.to_string()),
                "version" => version = Some(value.to_string()),
                "recipe_path" => recipe_path = Some(value.to_string()),
                "built_at" => built_at = DateTime::parse_from_rfc3339(value).ok().map(|d| d.with_timezone(&Utc)),
                "strip" => strip = value.parse::<bool>().ok(),
                "jobs" => jobs = value.parse::<usize>().ok(),
                "toolchain" => toolchain = value.parse::<bool>().unwrap_or(false),
                _ => {}
            }
        }

        Ok(Metadata {
            name: name.ok_or(Error::Corrupt("missing name"))?,
            version: version.ok_or(Error::Corrupt("missing version"))?,
            recipe_path: recipe_path.ok_or(Error::Corrupt("missing recipe_path"))?,
            built_at: built_at.ok_or(Error::Corrupt("missing or invalid built_at"))?,
            strip: strip.ok_or(Error::Corrupt("missing or invalid strip"))?,
            jobs: jobs.ok_or(Error::Corrupt("missing or invalid jobs"))?,
            toolchain,
        })
    }
}

/// A single-writer, flat-file-backed registry rooted at one directory.
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.META"))
    }

    fn files_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.files"))
    }

    pub fn has(&self, name: &str) -> bool {
        self.meta_path(name).exists() && self.files_path(name).exists()
    }

    pub fn put_metadata(&self, metadata: &Metadata) -> Result<(), Error> {
        fs::write(self.meta_path(&metadata.name), metadata.to_lines())?;
        Ok(())
    }

    pub fn get_metadata(&self, name: &str) -> Result<Metadata, Error> {
        let text = fs::read_to_string(self.meta_path(name)).map_err(|_| Error::UnknownPackage(name.to_string()))?;
        Metadata::from_lines(&text)
    }

    /// Stores the manifest, sorted and deduplicated - callers may pass
    /// paths in any order.
    pub fn put_manifest(&self, name: &str, paths: Vec<String>) -> Result<(), Error> {
        let body = paths.into_iter().sorted().dedup().join("\n");
        fs::write(self.files_path(name), body)?;
        Ok(())
    }

    pub fn get_manifest(&self, name: &str) -> Result<Vec<String>, Error> {
        let text = fs::read_to_string(self.files_path(name)).map_err(|_| Error::UnknownPackage(name.to_string()))?;
        Ok(text.lines().filter(|l| !l.is_empty()).map(ToString::to_string).collect())
    }

    /// Removes both records for a package. Idempotent - removing an
    /// already-absent package is not an error.
    pub fn drop(&self, name: &str) -> Result<(), Error> {
        let _ = fs::remove_file(self.meta_path(name));
        let _ = fs::remove_file(self.files_path(name));
        Ok(())
    }

    /// Every package name with a manifest on disk, used by revdep.
    pub fn iter_manifests(&self) -> Result<Vec<(String, Vec<String>)>, Error> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            let Some(name) = file_name.strip_suffix(".files") else { continue };
            out.push((name.to_string(), self.get_manifest(name)?));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("unknown package: {0}")]
    UnknownPackage(String),
    #[error("corrupt registry record: {0}")]
    Corrupt(&'static str),
}
