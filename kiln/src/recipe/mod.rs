// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Parses a recipe file into a validated [`Recipe`]. The format is a flat,
//! line-oriented `key=[value]` syntax with no shell expansion - values are
//! carried verbatim to the build driver.

use std::{path::Path, str::FromStr};

use fs_err as fs;
use thiserror::Error;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vcs {
    Http,
    Git,
}

impl FromStr for Vcs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "git" => Ok(Self::Git),
            other => Err(Error::InvalidVcs(other.to_string())),
        }
    }
}

/// A single parsed recipe, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    pub source_url: String,
    pub checksum: Option<String>,
    pub build_cmd: Option<String>,
    pub check_cmd: Option<String>,
    pub install_cmd: String,
    pub source_dir: Option<String>,
    pub patches: Vec<String>,
    pub vcs: Vcs,
    pub vcs_branch: Option<String>,
    pub extra_make_flags: Option<String>,
    pub build_subdir: Option<String>,
    pub toolchain: bool,
}

impl Recipe {
    /// Parse a recipe file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_str(&contents)
    }

    fn deduce_source_dir(&self) -> Option<String> {
        let basename = self.source_url.rsplit('/').next().unwrap_or(&self.source_url);
        let stem = basename.strip_suffix(".tar.gz").or_else(|| basename.strip_suffix(".tar.xz"))
            .or_else(|| basename.strip_suffix(".tar.bz2"))
            .or_else(|| basename.strip_suffix(".tgz"))
            .or_else(|| basename.strip_suffix(".zip"))
            .or_else(|| basename.strip_suffix(".tar"));
        stem.map(ToString::to_string)
    }

    /// The directory name the source tree extracts to, deducing it from
    /// the archive basename when the recipe did not specify one.
    pub fn effective_source_dir(&self) -> Option<String> {
        self.source_dir.clone().or_else(|| self.deduce_source_dir())
    }
}

impl FromStr for Recipe {
    type Err = Error;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut name = None;
        let mut version = None;
        let mut source_url = None;
        let mut checksum = None;
        let mut build_cmd = None;
        let mut check_cmd = None;
        let mut install_cmd = None;
        let mut source_dir = None;
        let mut patches = Vec::new();
        let mut vcs = None;
        let mut vcs_branch = None;
        let mut extra_make_flags = None;
        let mut build_subdir = None;
        let mut toolchain = false;

        for (lineno, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = parse_line(line).ok_or_else(|| Error::MalformedLine(lineno + 1))?;

            match key {
                "name" => name = Some(value.to_string()),
                "version" => version = Some(value.to_string()),
                "source_url" => source_url = Some(value.to_string()),
                "checksum" => checksum = Some(value.to_string()),
                "build_cmd" => build_cmd = Some(value.to_string()),
                "check_cmd" => check_cmd = Some(value.to_string()),
                "install_cmd" => install_cmd = Some(value.to_string()),
                "source_dir" => source_dir = Some(value.to_string()),
                "patches" => {
                    patches = value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string).collect();
                }
                "vcs" => vcs = Some(value.parse::<Vcs>()?),
                "vcs_branch" => vcs_branch = Some(value.to_string()),
                "extra_make_flags" => extra_make_flags = Some(value.to_string()),
                "build_subdir" => build_subdir = Some(value.to_string()),
                "toolchain" => toolchain = value == "yes" || value == "true",
                _ => {
                    // unknown keys are forward-compatible no-ops
                }
            }
        }

        let name = name.ok_or(Error::MissingField("name"))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')) {
            return Err(Error::InvalidName(name));
        }

        let version = version.ok_or(Error::MissingField("version"))?;
        let source_url = source_url.ok_or(Error::MissingField("source_url"))?;
        let install_cmd = install_cmd.ok_or(Error::MissingField("install_cmd"))?;

        let vcs = vcs.unwrap_or_else(|| {
            if source_url.starts_with("git://") || source_url.ends_with(".git") {
                Vcs::Git
            } else {
                Vcs::Http
            }
        });

        if vcs == Vcs::Git && source_dir.is_none() {
            return Err(Error::MissingSourceDirForGit);
        }

        Ok(Recipe {
            name,
            version,
            source_url,
            checksum,
            build_cmd,
            check_cmd,
            install_cmd,
            source_dir,
            patches,
            vcs,
            vcs_branch,
            extra_make_flags,
            build_subdir,
            toolchain,
        })
    }
}

/// Split a `key=[value]` line. The value is everything between the first
/// `[` after `=` and the final `]`, with no escaping of `]` inside.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let eq = line.find('=')?;
    let (key, rest) = line.split_at(eq);
    let rest = &rest[1..];

    let rest = rest.strip_prefix('[')?;
    let value = rest.strip_suffix(']')?;

    Some((key, value))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read recipe file")]
    Io(#[from] std::io::Error),
    #[error("malformed line {0}: expected key=[value]")]
    MalformedLine(usize),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid vcs value: {0}")]
    InvalidVcs(String),
    #[error("vcs=git recipes must specify source_dir explicitly")]
    MissingSourceDirForGit,
}
