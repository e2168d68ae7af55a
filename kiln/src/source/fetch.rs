// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use fs_err as fs;
use thiserror::Error;
use tracing::debug;

use crate::{recipe::Recipe, util};

/// Acquires a recipe's source, producing a local archive at a caller-chosen
/// path. HTTP downloads and git clones are both normalized to this shape.
pub trait Fetcher {
    fn fetch(&self, recipe: &Recipe, dest: &Path) -> Result<(), Error>;
}

/// Plain HTTP(S) download via blocking reqwest, following redirects.
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, recipe: &Recipe, dest: &Path) -> Result<(), Error> {
        let response = reqwest::blocking::get(&recipe.source_url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::BadStatus(status.as_u16()));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = response.bytes()?;
        fs::write(dest, &bytes)?;
        Ok(())
    }
}

/// Shallow git clone at the recipe's branch, archived to a tarball at `dest`
/// via `git archive` so the rest of the pipeline sees one uniform artifact.
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, recipe: &Recipe, dest: &Path) -> Result<(), Error> {
        let git = util::locate("git").ok_or(Error::MissingTool("git"))?;

        let scratch = tempfile_dir(dest)?;
        let branch = recipe.vcs_branch.as_deref();

        debug!(url = %recipe.source_url, branch, "cloning");

        let mut clone = Command::new(&git);
        clone.arg("clone").arg("--depth=1");
        if let Some(branch) = branch {
            clone.arg("--branch").arg(branch);
        }
        clone.arg(&recipe.source_url).arg(&scratch);

        run(&mut clone)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut archive = Command::new(&git);
        archive
            .arg("archive")
            .arg("--format=tar")
            .arg("--prefix")
            .arg(format!("{}/", recipe.effective_source_dir().unwrap_or_default()))
            .arg("-o")
            .arg(dest)
            .arg("HEAD")
            .current_dir(&scratch);

        let result = run(&mut archive);
        let _ = fs::remove_dir_all(&scratch);
        result
    }
}

fn tempfile_dir(dest: &Path) -> Result<PathBuf, Error> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let scratch = parent.join(format!(".{}-clone", dest.file_name().and_then(|s| s.to_str()).unwrap_or("src")));
    let _ = fs::remove_dir_all(&scratch);
    Ok(scratch)
}

fn run(cmd: &mut Command) -> Result<(), Error> {
    let status = cmd.status()?;
    if !status.success() {
        return Err(Error::GitFailed);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed")]
    Request(#[from] reqwest::Error),
    #[error("unexpected http status: {0}")]
    BadStatus(u16),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("git command failed")]
    GitFailed,
    #[error("required external tool not found: {0}")]
    MissingTool(&'static str),
}
