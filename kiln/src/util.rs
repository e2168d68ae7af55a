// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Small filesystem helpers shared across components.

use std::path::{Path, PathBuf};

use fs_err as fs;
use sha2::{Digest, Sha256};

/// Locate an external tool on `PATH`, returning `None` (not an error) if
/// it is absent - callers decide whether that is fatal.
pub fn locate(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

/// sha256 hex digest of a file's contents.
pub fn sha256_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = fs::File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Remove every directory in `dirs` that is empty, processing deepest
/// paths first so a directory is only ever removed once everything
/// beneath it in this batch is already gone. A directory outside of
/// `root`, or one that still has content, is left alone.
pub fn prune_empty_dirs(mut dirs: Vec<PathBuf>, root: &Path) {
    dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    dirs.dedup();

    for dir in dirs {
        if dir == root || !dir.starts_with(root) {
            continue;
        }
        let Ok(mut entries) = fs::read_dir(&dir) else {
            continue;
        };
        if entries.next().is_none() {
            let _ = fs::remove_dir(&dir);
        }
    }
}

/// The basename of a URL path, used to derive cache filenames. Falls back
/// to a naive split on `/` for scp-style git remotes (`git@host:repo.git`)
/// that `url::Url` won't parse as an absolute URL.
pub fn url_basename(source_url: &str) -> String {
    let parsed = url::Url::parse(source_url)
        .ok()
        .and_then(|url| url.path_segments().and_then(|mut segments| segments.next_back().map(ToString::to_string)));

    parsed.unwrap_or_else(|| source_url.rsplit('/').next().unwrap_or(source_url).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prune_removes_nested_empty_dirs_deepest_first() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        let nested = root.join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        prune_empty_dirs(vec![root.join("a/b/c"), root.join("a/b"), root.join("a")], root);

        assert!(!root.join("a").exists());
    }

    #[test]
    fn prune_stops_at_non_empty_directory() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/keep.txt"), b"x").unwrap();

        prune_empty_dirs(vec![root.join("a/b"), root.join("a")], root);

        assert!(!root.join("a/b").exists());
        assert!(root.join("a").exists());
    }

    #[test]
    fn url_basename_handles_ordinary_urls() {
        assert_eq!(url_basename("https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz"), "hello-2.12.tar.gz");
    }

    #[test]
    fn url_basename_falls_back_for_scp_style_git_remotes() {
        assert_eq!(url_basename("git@example.com:upstream/hello.git"), "hello.git");
    }
}
