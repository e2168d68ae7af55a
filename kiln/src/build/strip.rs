// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{path::Path, process::Command};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::util;

/// Walk the stage root and strip unneeded symbols from ELF binaries and
/// shared objects. Per-file failures are logged and do not abort the walk.
pub fn strip_stage(stage_root: &Path) -> Result<(), Error> {
    let strip_bin = util::locate("strip").ok_or(Error::MissingTool("strip"))?;

    for entry in WalkDir::new(stage_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_elf(entry.path()) {
            continue;
        }

        let status = Command::new(&strip_bin).arg("--strip-unneeded").arg(entry.path()).status();

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(path = %entry.path().display(), code = ?status.code(), "strip exited non-zero"),
            Err(error) => warn!(path = %entry.path().display(), %error, "failed to spawn strip"),
        }
    }

    Ok(())
}

fn is_elf(path: &Path) -> bool {
    use std::io::Read as _;

    let Ok(mut file) = fs_err::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return false;
    }
    magic == [0x7f, b'E', b'L', b'F']
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("required external tool not found: {0}")]
    MissingTool(&'static str),
}
