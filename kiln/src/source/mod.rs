// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Fetches, verifies, extracts, and patches a recipe's upstream source into
//! a work tree. Network and archive-format handling are behind the
//! [`Fetcher`] and [`Extractor`] traits so the pipeline itself stays
//! testable without touching the network or a real tarball.

pub mod extract;
pub mod fetch;

pub use extract::{Extractor, TarExtractor};
pub use fetch::{Fetcher, GitFetcher, HttpFetcher};

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use fs_err as fs;
use thiserror::Error;
use tracing::{debug, info};

use crate::{recipe::Recipe, util};

/// Computes a hex digest of a file's contents, so the core is not wedded
/// to one hash function.
pub trait Digester {
    fn digest_file(&self, path: &Path) -> Result<String, std::io::Error>;
}

/// sha256, the default and only digester this crate ships.
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest_file(&self, path: &Path) -> Result<String, std::io::Error> {
        util::sha256_file(path)
    }
}

/// Provisions the source tree for one recipe build.
pub struct Provisioner<'a> {
    pub sources_cache: &'a Path,
    pub work_dir: &'a Path,
    pub fetcher: &'a dyn Fetcher,
    pub extractor: &'a dyn Extractor,
    pub digester: &'a dyn Digester,
}

impl<'a> Provisioner<'a> {
    /// Run the full fetch -> verify -> extract -> patch sequence, returning
    /// the path to the extracted source top.
    pub fn provision(&self, recipe: &Recipe) -> Result<PathBuf, Error> {
        let archive_name = match recipe.vcs {
            // `git archive --format=tar` always produces a plain tarball
            // regardless of what the clone URL looks like, so the cache
            // filename must carry a `.tar` suffix for the extractor's
            // extension dispatch to recognize it.
            crate::recipe::Vcs::Git => format!("{}.tar", util::url_basename(&recipe.source_url)),
            crate::recipe::Vcs::Http => util::url_basename(&recipe.source_url),
        };
        let archive_path = self.sources_cache.join(archive_name);

        if !archive_path.exists() {
            info!(url = %recipe.source_url, "fetching source");
            self.fetcher.fetch(recipe, &archive_path)?;
        } else {
            debug!(path = %archive_path.display(), "reusing cached archive");
        }

        if let Some(expected) = &recipe.checksum {
            let actual = self.digester.digest_file(&archive_path)?;
            if &actual != expected {
                return Err(Error::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let source_dir = recipe
            .effective_source_dir()
            .ok_or_else(|| Error::UndeducedSourceDir)?;
        let source_top = self.work_dir.join(&source_dir);

        if !source_top.exists() {
            fs::create_dir_all(self.work_dir)?;
            self.extractor.extract(&archive_path, self.work_dir)?;
        }

        if !source_top.exists() {
            return Err(Error::ExtractionMismatch { expected: source_dir });
        }

        for patch in &recipe.patches {
            let patch_path = self.sources_cache.join(patch);
            apply_patch(&patch_path, &source_top)?;
        }

        Ok(source_top)
    }
}

fn apply_patch(patch_path: &Path, source_top: &Path) -> Result<(), Error> {
    let patch_bin = util::locate("patch").ok_or(Error::MissingTool("patch"))?;

    info!(patch = %patch_path.display(), "applying patch");

    let status = Command::new(patch_bin)
        .arg("-p1")
        .arg("-i")
        .arg(patch_path)
        .current_dir(source_top)
        .status()
        .map_err(Error::Io)?;

    if !status.success() {
        return Err(Error::PatchFailed {
            patch: patch_path.display().to_string(),
        });
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("fetch failed")]
    Fetch(#[from] fetch::Error),
    #[error("extraction failed")]
    Extract(#[from] extract::Error),
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("could not deduce source_dir from source_url; specify it explicitly")]
    UndeducedSourceDir,
    #[error("extraction did not produce expected source directory {expected}")]
    ExtractionMismatch { expected: String },
    #[error("patch {patch} failed to apply")]
    PatchFailed { patch: String },
    #[error("required external tool not found: {0}")]
    MissingTool(&'static str),
}
