// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{io::Read, path::Path};

use bzip2::read::BzDecoder;
use fs_err as fs;
use flate2::read::GzDecoder;
use thiserror::Error;
use xz2::read::XzDecoder;

/// Unpacks an archive into a destination directory.
pub trait Extractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), Error>;
}

/// Dispatches on the archive's file extension to the matching tar codec.
pub struct TarExtractor;

impl Extractor for TarExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), Error> {
        let name = archive.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        let file = fs::File::open(archive)?;

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            tar::Archive::new(GzDecoder::new(file)).unpack(dest)?;
        } else if name.ends_with(".tar.xz") {
            tar::Archive::new(XzDecoder::new(file)).unpack(dest)?;
        } else if name.ends_with(".tar.bz2") {
            tar::Archive::new(BzDecoder::new(file)).unpack(dest)?;
        } else if name.ends_with(".tar") {
            tar::Archive::new(file).unpack(dest)?;
        } else if name.ends_with(".zip") {
            let std_file = std::fs::File::open(archive)?;
            let mut zip = zip::ZipArchive::new(std_file).map_err(|e| Error::Zip(e.to_string()))?;
            zip.extract(dest).map_err(|e| Error::Zip(e.to_string()))?;
        } else if name.ends_with(".xz") {
            decompress_to_file(XzDecoder::new(file), dest, name, ".xz")?;
        } else if name.ends_with(".gz") {
            decompress_to_file(GzDecoder::new(file), dest, name, ".gz")?;
        } else if name.ends_with(".bz2") {
            decompress_to_file(BzDecoder::new(file), dest, name, ".bz2")?;
        } else {
            return Err(Error::Unsupported(name.to_string()));
        }

        Ok(())
    }
}

/// A bare compressed file (not a tar archive) decompresses to a single
/// regular file rather than unpacking into a directory tree - the file is
/// placed in `dest` under its name with the compression suffix stripped.
fn decompress_to_file(mut reader: impl Read, dest: &Path, name: &str, suffix: &str) -> Result<(), Error> {
    fs::create_dir_all(dest)?;
    let stripped = name.strip_suffix(suffix).unwrap_or(name);
    let mut out = fs::File::create(dest.join(stripped))?;
    std::io::copy(&mut reader, &mut out)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("unsupported archive format: {0}")]
    Unsupported(String),
    #[error("zip error: {0}")]
    Zip(String),
}
