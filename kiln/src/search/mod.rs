// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Recipe-tree text search and installed-package metadata lookup.


use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::{
    recipe::Recipe,
    registry::{Metadata, Registry},
};

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub path: PathBuf,
    pub name: String,
    pub version: String,
}

/// Walks `repo` for `*.recipe` files whose path or parsed name contains
/// `term` (case-insensitive). Recipes that fail to parse are skipped with
/// a warning rather than aborting the whole search.
pub fn search(repo: &Path, term: &str) -> Vec<SearchHit> {
    let needle = term.to_lowercase();
    let mut hits = Vec::new();

    for entry in WalkDir::new(repo).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("recipe") {
            continue;
        }

        let path_matches = entry.path().to_string_lossy().to_lowercase().contains(&needle);

        match Recipe::from_path(entry.path()) {
            Ok(recipe) => {
                if path_matches || recipe.name.to_lowercase().contains(&needle) {
                    hits.push(SearchHit {
                        path: entry.path().to_path_buf(),
                        name: recipe.name,
                        version: recipe.version,
                    });
                }
            }
            Err(error) => warn!(path = %entry.path().display(), %error, "skipping unparseable recipe during search"),
        }
    }

    hits
}

/// Locates a recipe in `repo` whose filename stem matches `name` exactly -
/// used by revdep's fix mode to find the recipe for a candidate owner
/// independent of where it was originally built from.
pub fn find_by_stem(repo: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(repo)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("recipe")
                && entry.path().file_stem().and_then(|s| s.to_str()) == Some(name)
        })
        .map(|entry| entry.path().to_path_buf())
}

/// Looks up a package's metadata record.
pub fn info(registry: &Registry, name: &str) -> Result<Metadata, Error> {
    registry.get_metadata(name).map_err(|_| Error::UnknownPackage(name.to_string()))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown package: {0}")]
    UnknownPackage(String),
}
