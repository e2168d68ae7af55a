// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Archives a stage root into a compressed tarball rooted at `/`.

use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use fs_err as fs;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::info;
use xz2::write::XzEncoder;

use crate::config::Codec;

/// Produces `{pkgout}/{name}-{version}.tar.{codec}` from a stage root.
pub struct Packager<'a> {
    pub pkgout: &'a Path,
    pub codec: Codec,
}

impl<'a> Packager<'a> {
    pub fn package(&self, stage_root: &Path, name: &str, version: &str) -> Result<PathBuf, Error> {
        fs::create_dir_all(self.pkgout)?;

        let ext = match self.codec {
            Codec::Xz => "tar.xz",
            Codec::Gz => "tar.gz",
            Codec::Bz2 => "tar.bz2",
        };
        let out_path = self.pkgout.join(format!("{name}-{version}.{ext}"));

        info!(path = %out_path.display(), "packaging");

        let file = fs::File::create(&out_path)?;

        match self.codec {
            Codec::Xz => {
                let encoder = XzEncoder::new(file, 6);
                let encoder = write_tar(stage_root, encoder)?;
                encoder.finish()?;
            }
            Codec::Gz => {
                let encoder = GzEncoder::new(file, flate2::Compression::default());
                let encoder = write_tar(stage_root, encoder)?;
                encoder.finish()?;
            }
            Codec::Bz2 => {
                let encoder = BzEncoder::new(file, bzip2::Compression::default());
                let encoder = write_tar(stage_root, encoder)?;
                encoder.finish()?;
            }
        }

        Ok(out_path)
    }
}

fn write_tar<W: std::io::Write>(stage_root: &Path, writer: W) -> Result<W, Error> {
    let mut builder = tar::Builder::new(writer);
    builder.append_dir_all(".", stage_root)?;
    Ok(builder.into_inner()?)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
}
