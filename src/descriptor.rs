//! Project descriptor parsing
//!
//! The descriptor is the read-only input to a build: project identity,
//! dependency specifiers, inclusion/exclusion rules and dynamic metadata
//! configuration, loaded from a `nar.toml` document. Serde-level types are
//! lowered into the explicit model right after parsing so the rest of the
//! crate never probes for optional attributes.

use crate::{NarError, NarResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Regex matching a `version = "__version__"` placeholder
const VERSION_PLACEHOLDER: &str = r#"version\s*=\s*["']__version__["']"#;

/// Regex matching a `description = "__description__"` placeholder
const DESCRIPTION_PLACEHOLDER: &str = r#"description\s*=\s*["']__description__["']"#;

// ============================================================================
// Raw serde types
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    project: RawProject,
    #[serde(default)]
    packages: Vec<RawPackageRule>,
    #[serde(default)]
    include: Vec<RawPathRule>,
    #[serde(default)]
    dynamic: RawDynamic,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    readme: Option<ReadmeEntry>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

/// A readme declaration: one path or an ordered list of paths
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReadmeEntry {
    Single(PathBuf),
    Multiple(Vec<PathBuf>),
}

/// A format declaration: one identifier or a list of identifiers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FormatEntry {
    Single(String),
    Multiple(Vec<String>),
}

impl FormatEntry {
    fn into_list(entry: Option<Self>) -> Vec<String> {
        match entry {
            None => Vec::new(),
            Some(FormatEntry::Single(f)) => vec![f],
            Some(FormatEntry::Multiple(fs)) => fs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPackageRule {
    include: String,
    #[serde(default)]
    from: Option<PathBuf>,
    #[serde(default)]
    to: Option<PathBuf>,
    #[serde(default)]
    format: Option<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPathRule {
    path: String,
    #[serde(default)]
    format: Option<FormatEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDynamic {
    #[serde(default)]
    version: Option<PathBuf>,
    #[serde(default)]
    description: Option<PathBuf>,
}

// ============================================================================
// Public model
// ============================================================================

/// A declarative inclusion rule
///
/// Every rule carries an explicit format list; an empty list means the rule
/// applies to all archive formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeRule {
    /// A whole package directory (or glob over directories), with optional
    /// source-root and target-directory overrides
    Package {
        /// Package name or glob, relative to the source root
        include: String,
        /// Source root override, relative to the project root
        from: Option<PathBuf>,
        /// Target directory inside the archive
        to: Option<PathBuf>,
        /// Formats this rule applies to (empty = all)
        formats: Vec<String>,
    },
    /// An explicit file or glob, relative to the project root
    Path {
        /// File path or glob
        pattern: String,
        /// Formats this rule applies to (empty = all)
        formats: Vec<String>,
    },
}

impl IncludeRule {
    /// Whether this rule applies when building the given format
    pub fn applies_to(&self, format: &str) -> bool {
        let formats = match self {
            IncludeRule::Package { formats, .. } => formats,
            IncludeRule::Path { formats, .. } => formats,
        };
        formats.is_empty() || formats.iter().any(|f| f == format)
    }
}

/// A single placeholder rewrite: first regex match in `file` is replaced
#[derive(Debug, Clone)]
pub struct DynamicPatch {
    /// Target file, relative to the project root
    pub file: PathBuf,
    /// Regex matched against the staged file content
    pub pattern: String,
    /// Replacement for the first match
    pub replacement: String,
}

/// Read-only project metadata consumed by the archive builder
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    root: PathBuf,
    name: String,
    version: String,
    description: Option<String>,
    readmes: Vec<PathBuf>,
    dependencies: Vec<String>,
    exclude: Vec<String>,
    rules: Vec<IncludeRule>,
    dynamic_version: Option<PathBuf>,
    dynamic_description: Option<PathBuf>,
}

impl ProjectDescriptor {
    /// Load a descriptor from a TOML file; the project root is the file's
    /// parent directory
    pub fn from_file(path: impl AsRef<Path>) -> NarResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root)
    }

    /// Parse a descriptor from TOML text with an explicit project root
    pub fn parse(content: &str, root: impl Into<PathBuf>) -> NarResult<Self> {
        let raw: RawDescriptor = toml::from_str(content)?;

        let readmes = match raw.project.readme {
            None => Vec::new(),
            Some(ReadmeEntry::Single(p)) => vec![p],
            Some(ReadmeEntry::Multiple(ps)) => ps,
        };

        let mut rules = Vec::new();
        for pkg in raw.packages {
            rules.push(IncludeRule::Package {
                include: pkg.include,
                from: pkg.from,
                to: pkg.to,
                formats: FormatEntry::into_list(pkg.format),
            });
        }
        for inc in raw.include {
            rules.push(IncludeRule::Path {
                pattern: inc.path,
                formats: FormatEntry::into_list(inc.format),
            });
        }

        let descriptor = Self {
            root: root.into(),
            name: raw.project.name,
            version: raw.project.version,
            description: raw.project.description,
            readmes,
            dependencies: raw.project.dependencies,
            exclude: raw.project.exclude,
            rules,
            dynamic_version: raw.dynamic.version,
            dynamic_description: raw.dynamic.description,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> NarResult<()> {
        if self.name.trim().is_empty() {
            return Err(NarError::Descriptor("project name is empty".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(NarError::Descriptor(format!(
                "project `{}` has an empty version",
                self.name
            )));
        }
        for rule in &self.rules {
            let pattern = match rule {
                IncludeRule::Package { include, .. } => include,
                IncludeRule::Path { pattern, .. } => pattern,
            };
            if pattern.trim().is_empty() {
                return Err(NarError::Descriptor(format!(
                    "project `{}` has an inclusion rule with an empty pattern",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Project description, if declared
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared readme files, in declaration order
    pub fn readmes(&self) -> &[PathBuf] {
        &self.readmes
    }

    /// Runtime dependency specifiers
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether any runtime dependency is declared
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// Exclusion globs, matched against source-root-relative paths
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Inclusion rules in declaration order
    pub fn rules(&self) -> &[IncludeRule] {
        &self.rules
    }

    /// Placeholder rewrites derived from the `[dynamic]` section
    pub fn dynamic_patches(&self) -> Vec<DynamicPatch> {
        let mut patches = Vec::new();
        if let Some(file) = &self.dynamic_version {
            patches.push(DynamicPatch {
                file: file.clone(),
                pattern: VERSION_PLACEHOLDER.to_string(),
                replacement: format!("version = \"{}\"", self.version),
            });
        }
        if let Some(file) = &self.dynamic_description {
            patches.push(DynamicPatch {
                file: file.clone(),
                pattern: DESCRIPTION_PLACEHOLDER.to_string(),
                replacement: format!(
                    "description = \"{}\"",
                    self.description.as_deref().unwrap_or_default()
                ),
            });
        }
        patches
    }
}

/// Normalize a project name for use in file names
///
/// Runs of `-`, `_` and `.` collapse to a single underscore and the result
/// is lowercased, so `My-Project..Name` becomes `my_project_name`.
pub fn distribution_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !prev_sep {
                out.push('_');
            }
            prev_sep = true;
        } else {
            out.extend(ch.to_lowercase());
            prev_sep = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_name() {
        assert_eq!(distribution_name("foo"), "foo");
        assert_eq!(distribution_name("My-Project"), "my_project");
        assert_eq!(distribution_name("a-_.b"), "a_b");
        assert_eq!(distribution_name("pretty.print.json"), "pretty_print_json");
    }

    #[test]
    fn test_rule_applies_to() {
        let rule = IncludeRule::Path {
            pattern: "data/*".to_string(),
            formats: Vec::new(),
        };
        assert!(rule.applies_to("nar"));

        let rule = IncludeRule::Path {
            pattern: "data/*".to_string(),
            formats: vec!["sdist".to_string()],
        };
        assert!(!rule.applies_to("nar"));
        assert!(rule.applies_to("sdist"));
    }
}
