// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Gathers the environment-variable configuration surface exactly once at
//! process start into an immutable record. Nothing downstream of [`Config::gather`]
//! reads `std::env` again.

use std::{env, num::ParseIntError, path::PathBuf, str::FromStr};

use thiserror::Error;

/// Compression codec used for package archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Codec {
    Xz,
    Gz,
    Bz2,
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xz" => Ok(Self::Xz),
            "gz" => Ok(Self::Gz),
            "bz2" => Ok(Self::Bz2),
            other => Err(Error::InvalidCodec(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Auto,
    Always,
    Never,
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(Error::InvalidColor(other.to_string())),
        }
    }
}

/// Immutable configuration snapshot, threaded explicitly into every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub tmproot: PathBuf,
    pub repo: PathBuf,
    pub sources: PathBuf,
    pub registro: PathBuf,
    pub pkgout: PathBuf,
    pub hooks: PathBuf,
    pub makeflags: Option<String>,
    pub jobs: usize,
    pub strip: bool,
    pub pkgcomp: Codec,
    pub color: Color,
}

impl Config {
    /// Read the recognized environment surface once and resolve every
    /// sentinel (`JOBS=auto`, missing `PKGOUT` defaulting to cwd, ...).
    pub fn gather() -> Result<Self, Error> {
        let tmproot = path_var("TMPROOT").unwrap_or_else(|| PathBuf::from("/var/tmp/kiln"));
        let repo = path_var("REPO").unwrap_or_else(|| PathBuf::from("/usr/recipes"));
        let sources = path_var("SOURCES").unwrap_or_else(|| tmproot.join("sources"));
        let registro = path_var("REGISTRO").unwrap_or_else(|| PathBuf::from("/var/lib/kiln/registry"));
        let pkgout = path_var("PKGOUT").map_or_else(|| env::current_dir().map_err(Error::CurrentDir), Ok)?;
        let hooks = path_var("HOOKS").unwrap_or_else(|| PathBuf::from("/etc/kiln/hooks.d"));
        let makeflags = env::var("MAKEFLAGS").ok();

        let jobs = match env::var("JOBS").ok().as_deref() {
            None | Some("auto") => online_cpus(),
            Some(value) => value.parse::<usize>().map_err(Error::InvalidJobs)?,
        };

        let strip = match env::var("STRIP").ok().as_deref() {
            None => true,
            Some("yes") => true,
            Some("no") => false,
            Some(other) => return Err(Error::InvalidStrip(other.to_string())),
        };

        let pkgcomp = env::var("PKGCOMP")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(Codec::Xz);

        let color = env::var("COLOR")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(Color::Auto);

        Ok(Self {
            tmproot,
            repo,
            sources,
            registro,
            pkgout,
            hooks,
            makeflags,
            jobs,
            strip,
            pkgcomp,
            color,
        })
    }

    /// Compute the effective `MAKEFLAGS` for a build, applying the recipe's
    /// `extra_make_flags` override, else falling back to `-j{jobs}`.
    pub fn effective_makeflags(&self, extra_make_flags: Option<&str>) -> String {
        let mut flags = self.makeflags.clone().unwrap_or_default();

        if let Some(extra) = extra_make_flags {
            if !flags.is_empty() {
                flags.push(' ');
            }
            flags.push_str(extra);
        } else if !flags.contains("-j") {
            if !flags.is_empty() {
                flags.push(' ');
            }
            flags.push_str(&format!("-j{}", self.jobs));
        }

        flags
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn online_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid PKGCOMP codec: {0}")]
    InvalidCodec(String),
    #[error("invalid COLOR value: {0}")]
    InvalidColor(String),
    #[error("invalid STRIP value: {0}")]
    InvalidStrip(String),
    #[error("invalid JOBS value")]
    InvalidJobs(#[source] ParseIntError),
    #[error("could not determine current directory")]
    CurrentDir(#[source] std::io::Error),
}
