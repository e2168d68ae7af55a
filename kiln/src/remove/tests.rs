// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use fs_err as fs;
use tempfile::tempdir;

use super::*;

#[test]
fn remove_erases_every_manifest_file_and_drops_registry() {
    let root = tempdir().unwrap();
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();

    fs::create_dir_all(root.path().join("usr/bin")).unwrap();
    fs::write(root.path().join("usr/bin/hello"), b"bin").unwrap();

    registry.put_manifest("hello", vec!["/usr/bin/hello".to_string()]).unwrap();
    registry
        .put_metadata(&crate::registry::Metadata {
            name: "hello".to_string(),
            version: "2.12".to_string(),
            recipe_path: "hello.recipe".to_string(),
            built_at: chrono::Utc::now(),
            strip: true,
            jobs: 1,
            toolchain: false,
        })
        .unwrap();

    let remover = Remover {
        registry: &registry,
        root: root.path(),
    };

    remover.remove("hello").unwrap();

    assert!(!root.path().join("usr/bin/hello").exists());
    assert!(!registry.has("hello"));
}

#[test]
fn remove_prunes_emptied_nested_directories() {
    let root = tempdir().unwrap();
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();

    fs::create_dir_all(root.path().join("usr/share/doc/hello")).unwrap();
    fs::write(root.path().join("usr/share/doc/hello/readme"), b"x").unwrap();

    registry
        .put_manifest("hello", vec!["/usr/share/doc/hello/readme".to_string()])
        .unwrap();
    registry
        .put_metadata(&crate::registry::Metadata {
            name: "hello".to_string(),
            version: "2.12".to_string(),
            recipe_path: "hello.recipe".to_string(),
            built_at: chrono::Utc::now(),
            strip: true,
            jobs: 1,
            toolchain: false,
        })
        .unwrap();

    let remover = Remover {
        registry: &registry,
        root: root.path(),
    };

    remover.remove("hello").unwrap();

    assert!(!root.path().join("usr/share/doc/hello").exists());
}

#[test]
fn remove_leaves_unrelated_files_alone() {
    let root = tempdir().unwrap();
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();

    fs::create_dir_all(root.path().join("usr/bin")).unwrap();
    fs::write(root.path().join("usr/bin/hello"), b"bin").unwrap();
    fs::write(root.path().join("usr/bin/other"), b"bin").unwrap();

    registry.put_manifest("hello", vec!["/usr/bin/hello".to_string()]).unwrap();
    registry
        .put_metadata(&crate::registry::Metadata {
            name: "hello".to_string(),
            version: "2.12".to_string(),
            recipe_path: "hello.recipe".to_string(),
            built_at: chrono::Utc::now(),
            strip: true,
            jobs: 1,
            toolchain: false,
        })
        .unwrap();

    let remover = Remover {
        registry: &registry,
        root: root.path(),
    };

    remover.remove("hello").unwrap();

    assert!(root.path().join("usr/bin/other").exists());
}

#[test]
fn remove_unknown_package_errors() {
    let root = tempdir().unwrap();
    let registry_dir = tempdir().unwrap();
    let registry = Registry::open(registry_dir.path()).unwrap();

    let remover = Remover {
        registry: &registry,
        root: root.path(),
    };

    let err = remover.remove("nonexistent").unwrap_err();
    assert!(matches!(err, Error::UnknownPackage(_)));
}
