// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use fs_err as fs;
use tempfile::tempdir;

use super::*;

fn make_archive(stage: &Path, archive_path: &Path) {
    let file = fs::File::create(archive_path).unwrap();
    let mut builder = tar::Builder::new(file);
    builder.append_dir_all(".", stage).unwrap();
    builder.finish().unwrap();
}

#[test]
fn manifest_matches_staged_files() {
    let stage = tempdir().unwrap();
    fs::create_dir_all(stage.path().join("usr/bin")).unwrap();
    fs::write(stage.path().join("usr/bin/hello"), b"bin").unwrap();
    fs::create_dir_all(stage.path().join("usr/share/doc")).unwrap();
    fs::write(stage.path().join("usr/share/doc/hello.txt"), b"doc").unwrap();

    let archive_dir = tempdir().unwrap();
    let archive_path = archive_dir.path().join("hello-2.12.tar");
    make_archive(stage.path(), &archive_path);

    let install_root = tempdir().unwrap();
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();

    let installer = Installer {
        registry: &registry,
        root: install_root.path(),
        jobs: 4,
        strip: true,
    };

    let recipe_path = Path::new("/usr/recipes/hello.recipe");
    let manifest = installer.install(&archive_path, "hello", "2.12", recipe_path, false).unwrap();

    let mut expected = vec!["/usr/bin/hello".to_string(), "/usr/share/doc/hello.txt".to_string()];
    expected.sort();
    let mut got = manifest.clone();
    got.sort();
    assert_eq!(got, expected);

    assert!(install_root.path().join("usr/bin/hello").exists());
    assert_eq!(registry.get_manifest("hello").unwrap(), got);
}

#[test]
fn unsupported_extension_errors() {
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();
    let install_root = tempdir().unwrap();

    let installer = Installer {
        registry: &registry,
        root: install_root.path(),
        jobs: 1,
        strip: false,
    };

    let bogus_dir = tempdir().unwrap();
    let bogus = bogus_dir.path().join("hello-2.12.zip");
    fs::write(&bogus, b"not a tarball").unwrap();

    let err = installer.install(&bogus, "hello", "2.12", Path::new("hello.recipe"), false).unwrap_err();
    assert!(matches!(err, Error::UnsupportedArchive(_)));
}
