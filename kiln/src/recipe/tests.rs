// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use super::*;

fn hello_recipe() -> &'static str {
    "name=[hello]\n\
     version=[2.12]\n\
     source_url=[https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz]\n\
     checksum=[abc123]\n\
     build_cmd=[make]\n\
     install_cmd=[make install]\n"
}

#[test]
fn parse_roundtrip() {
    let recipe: Recipe = hello_recipe().parse().unwrap();
    assert_eq!(recipe.name, "hello");
    assert_eq!(recipe.version, "2.12");
    assert_eq!(recipe.source_url, "https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz");
    assert_eq!(recipe.checksum.as_deref(), Some("abc123"));
    assert_eq!(recipe.build_cmd.as_deref(), Some("make"));
    assert_eq!(recipe.install_cmd, "make install");
    assert_eq!(recipe.vcs, Vcs::Http);
}

#[test]
fn unknown_key_is_ignored() {
    let with_unknown = format!("{}unknown=[whatever]\n", hello_recipe());
    let a: Recipe = hello_recipe().parse().unwrap();
    let b: Recipe = with_unknown.parse().unwrap();
    assert_eq!(a, b);
}

#[test]
fn missing_required_field_errors() {
    let text = "name=[hello]\nversion=[2.12]\n";
    let err = text.parse::<Recipe>().unwrap_err();
    assert!(matches!(err, Error::MissingField("source_url")));
}

#[test]
fn malformed_line_errors() {
    let text = "name=hello\n";
    let err = text.parse::<Recipe>().unwrap_err();
    assert!(matches!(err, Error::MalformedLine(1)));
}

#[test]
fn patches_are_comma_separated() {
    let text = format!("{}patches=[a.patch, b.patch,,c.patch]\n", hello_recipe());
    let recipe: Recipe = text.parse().unwrap();
    assert_eq!(recipe.patches, vec!["a.patch", "b.patch", "c.patch"]);
}

#[test]
fn git_vcs_requires_source_dir() {
    let text = "name=[hello]\nversion=[1]\nsource_url=[git://example.com/hello.git]\ninstall_cmd=[make install]\nvcs=[git]\n";
    let err = text.parse::<Recipe>().unwrap_err();
    assert!(matches!(err, Error::MissingSourceDirForGit));
}

#[test]
fn source_dir_is_deduced_from_url() {
    let recipe: Recipe = hello_recipe().parse().unwrap();
    assert_eq!(recipe.effective_source_dir().as_deref(), Some("hello-2.12"));
}

#[test]
fn invalid_vcs_value_errors() {
    let text = format!("{}vcs=[svn]\n", hello_recipe());
    let err = text.parse::<Recipe>().unwrap_err();
    assert!(matches!(err, Error::InvalidVcs(_)));
}
