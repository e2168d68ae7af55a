// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Reverses an install: deletes every file the package's manifest names,
//! prunes directories left empty by that, and drops the registry records.

#[cfg(test)]
mod tests;

use std::path::Path;

use fs_err as fs;
use thiserror::Error;
use tracing::{info, warn};

use crate::registry::Registry;

/// Emitted after a successful removal, for an external hook sink to act on.
/// Hook execution itself is out of scope here.
#[derive(Debug, Clone)]
pub struct RemovedEvent {
    pub name: String,
}

pub struct Remover<'a> {
    pub registry: &'a Registry,
    pub root: &'a Path,
}

impl<'a> Remover<'a> {
    pub fn remove(&self, name: &str) -> Result<RemovedEvent, Error> {
        if !self.registry.has(name) {
            return Err(Error::UnknownPackage(name.to_string()));
        }

        let manifest = self.registry.get_manifest(name)?;
        let mut parents = Vec::new();

        for rel in &manifest {
            let absolute = self.root.join(rel.trim_start_matches('/'));
            match fs::remove_file(&absolute) {
                Ok(()) => {
                    if let Some(parent) = absolute.parent() {
                        parents.push(parent.to_path_buf());
                    }
                }
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %absolute.display(), "file already absent during remove");
                }
                Err(error) => {
                    warn!(path = %absolute.display(), %error, "failed to remove file");
                }
            }
        }

        crate::util::prune_empty_dirs(parents, self.root);

        self.registry.drop(name)?;

        info!(name, "removed");

        Ok(RemovedEvent { name: name.to_string() })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("registry error")]
    Registry(#[from] crate::registry::Error),
    #[error("unknown package: {0}")]
    UnknownPackage(String),
}
