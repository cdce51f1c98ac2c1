//! Tests for nar-pack descriptor parsing

use nar_pack::{IncludeRule, NarError, ProjectDescriptor};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_parse_minimal() {
    let toml = r#"
[project]
name = "foo"
version = "1.2.3"
    "#;

    let descriptor = ProjectDescriptor::parse(toml, "/tmp/project").unwrap();
    assert_eq!(descriptor.name(), "foo");
    assert_eq!(descriptor.version(), "1.2.3");
    assert_eq!(descriptor.description(), None);
    assert!(descriptor.readmes().is_empty());
    assert!(descriptor.rules().is_empty());
    assert!(!descriptor.has_dependencies());
    assert!(descriptor.dynamic_patches().is_empty());
}

#[test]
fn test_parse_single_readme() {
    let toml = r#"
[project]
name = "foo"
version = "0.1.0"
readme = "README.md"
    "#;

    let descriptor = ProjectDescriptor::parse(toml, ".").unwrap();
    assert_eq!(descriptor.readmes(), &[PathBuf::from("README.md")]);
}

#[test]
fn test_parse_readme_list() {
    let toml = r#"
[project]
name = "foo"
version = "0.1.0"
readme = ["README-1.md", "README-2.md"]
    "#;

    let descriptor = ProjectDescriptor::parse(toml, ".").unwrap();
    assert_eq!(
        descriptor.readmes(),
        &[PathBuf::from("README-1.md"), PathBuf::from("README-2.md")]
    );
}

#[test]
fn test_parse_rules() {
    let toml = r#"
[project]
name = "foo"
version = "0.1.0"

[[packages]]
include = "foo"
from = "src"
to = "lib"
format = "nar"

[[include]]
path = "data/*.json"
format = ["nar", "sdist"]

[[include]]
path = "NOTES.txt"
    "#;

    let descriptor = ProjectDescriptor::parse(toml, ".").unwrap();
    assert_eq!(descriptor.rules().len(), 3);

    match &descriptor.rules()[0] {
        IncludeRule::Package {
            include,
            from,
            to,
            formats,
        } => {
            assert_eq!(include, "foo");
            assert_eq!(from.as_deref(), Some(Path::new("src")));
            assert_eq!(to.as_deref(), Some(Path::new("lib")));
            assert_eq!(formats, &["nar".to_string()]);
        }
        other => panic!("expected package rule, got {:?}", other),
    }

    match &descriptor.rules()[1] {
        IncludeRule::Path { pattern, formats } => {
            assert_eq!(pattern, "data/*.json");
            assert_eq!(formats.len(), 2);
        }
        other => panic!("expected path rule, got {:?}", other),
    }

    // No format key: the rule applies to every format
    assert!(descriptor.rules()[2].applies_to("nar"));
    assert!(descriptor.rules()[2].applies_to("anything"));
}

#[test]
fn test_parse_dependencies_and_exclude() {
    let toml = r#"
[project]
name = "foo"
version = "0.1.0"
dependencies = ["requests>=2.31", "numpy==1.26.4"]
exclude = ["**/*.secret"]
    "#;

    let descriptor = ProjectDescriptor::parse(toml, ".").unwrap();
    assert!(descriptor.has_dependencies());
    assert_eq!(descriptor.dependencies().len(), 2);
    assert_eq!(descriptor.exclude(), &["**/*.secret".to_string()]);
}

#[test]
fn test_dynamic_patches() {
    let toml = r#"
[project]
name = "foo"
version = "1.2.3"
description = "A demo"

[dynamic]
version = "foo/meta.py"
description = "foo/meta.py"
    "#;

    let descriptor = ProjectDescriptor::parse(toml, ".").unwrap();
    let patches = descriptor.dynamic_patches();
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].file, PathBuf::from("foo/meta.py"));
    assert_eq!(patches[0].replacement, "version = \"1.2.3\"");
    assert_eq!(patches[1].replacement, "description = \"A demo\"");
}

#[test]
fn test_empty_name_rejected() {
    let toml = r#"
[project]
name = ""
version = "0.1.0"
    "#;

    let err = ProjectDescriptor::parse(toml, ".").unwrap_err();
    assert!(matches!(err, NarError::Descriptor(_)));
}

#[test]
fn test_empty_version_rejected() {
    let toml = r#"
[project]
name = "foo"
version = " "
    "#;

    assert!(ProjectDescriptor::parse(toml, ".").is_err());
}

#[test]
fn test_empty_rule_pattern_rejected() {
    let toml = r#"
[project]
name = "foo"
version = "0.1.0"

[[include]]
path = ""
    "#;

    assert!(ProjectDescriptor::parse(toml, ".").is_err());
}

#[test]
fn test_invalid_toml_rejected() {
    let err = ProjectDescriptor::parse("not toml at all [", ".").unwrap_err();
    assert!(matches!(err, NarError::TomlParse(_)));
}

#[test]
fn test_from_file_sets_root() {
    let temp = TempDir::new().unwrap();
    let toml_path = temp.path().join("nar.toml");
    std::fs::write(
        &toml_path,
        "[project]\nname = \"foo\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();

    let descriptor = ProjectDescriptor::from_file(&toml_path).unwrap();
    assert_eq!(descriptor.root(), temp.path());
}
