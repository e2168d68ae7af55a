// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use chrono::Utc;
use tempfile::tempdir;

use super::*;

fn sample_metadata() -> Metadata {
    Metadata {
        name: "hello".to_string(),
        version: "2.12".to_string(),
        recipe_path: "/usr/recipes/hello-2.12.recipe".to_string(),
        built_at: Utc::now(),
        strip: true,
        jobs: 4,
        toolchain: false,
    }
}

#[test]
fn metadata_roundtrips() {
    let tmp = tempdir().unwrap();
    let registry = Registry::open(tmp.path()).unwrap();
    let metadata = sample_metadata();

    registry.put_metadata(&metadata).unwrap();
    let loaded = registry.get_metadata("hello").unwrap();

    assert_eq!(loaded.name, metadata.name);
    assert_eq!(loaded.version, metadata.version);
    assert_eq!(loaded.strip, metadata.strip);
    assert_eq!(loaded.jobs, metadata.jobs);
    assert_eq!(loaded.toolchain, metadata.toolchain);
}

#[test]
fn manifest_is_sorted_and_deduplicated() {
    let tmp = tempdir().unwrap();
    let registry = Registry::open(tmp.path()).unwrap();

    registry
        .put_manifest("hello", vec!["/usr/bin/hello".into(), "/usr/share/doc/hello".into(), "/usr/bin/hello".into()])
        .unwrap();

    let manifest = registry.get_manifest("hello").unwrap();
    assert_eq!(manifest, vec!["/usr/bin/hello".to_string(), "/usr/share/doc/hello".to_string()]);
}

#[test]
fn drop_removes_both_records() {
    let tmp = tempdir().unwrap();
    let registry = Registry::open(tmp.path()).unwrap();

    registry.put_metadata(&sample_metadata()).unwrap();
    registry.put_manifest("hello", vec!["/usr/bin/hello".into()]).unwrap();
    assert!(registry.has("hello"));

    registry.drop("hello").unwrap();
    assert!(!registry.has("hello"));
}

#[test]
fn unknown_package_errors() {
    let tmp = tempdir().unwrap();
    let registry = Registry::open(tmp.path()).unwrap();

    let err = registry.get_metadata("nonexistent").unwrap_err();
    assert!(matches!(err, Error::UnknownPackage(_)));
}

#[test]
fn iter_manifests_is_sorted_by_name() {
    let tmp = tempdir().unwrap();
    let registry = Registry::open(tmp.path()).unwrap();

    registry.put_manifest("zeta", vec!["/usr/bin/zeta".into()]).unwrap();
    registry.put_manifest("alpha", vec!["/usr/bin/alpha".into()]).unwrap();

    let all = registry.iter_manifests().unwrap();
    let names: Vec<_> = all.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}
