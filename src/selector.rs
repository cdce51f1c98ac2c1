//! File selection
//!
//! Evaluates the descriptor's inclusion rules against the project tree and
//! produces the definitive set of files to package, each mapped to its
//! archive-relative path. Compiled bytecode artifacts (`__pycache__`
//! directories, `.pyc` files) are never eligible, regardless of rules.

use crate::descriptor::{IncludeRule, ProjectDescriptor};
use crate::{NarError, NarResult};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A file or empty directory resolved for packaging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Absolute source path
    pub source: PathBuf,
    /// Forward-slash separated path inside the archive
    pub archive_path: String,
    /// Whether this entry stages an empty directory
    pub is_dir: bool,
}

/// Evaluates inclusion rules for one archive format
pub struct FileSelector<'a> {
    descriptor: &'a ProjectDescriptor,
    format: String,
    ignore_formats: bool,
}

impl<'a> FileSelector<'a> {
    /// Create a selector for the given archive format identifier
    pub fn new(descriptor: &'a ProjectDescriptor, format: impl Into<String>) -> Self {
        Self {
            descriptor,
            format: format.into(),
            ignore_formats: false,
        }
    }

    /// Disable format filtering so every rule applies
    pub fn ignore_formats(mut self, ignore: bool) -> Self {
        self.ignore_formats = ignore;
        self
    }

    /// Resolve the definitive, deduplicated selection
    ///
    /// Return order is sorted by archive path, but callers that need
    /// deterministic output must not rely on it and should sort for
    /// themselves.
    pub fn select(&self) -> NarResult<Vec<StagedFile>> {
        let exclusions: Vec<glob::Pattern> = self
            .descriptor
            .exclude()
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<_, _>>()?;

        let mut selected: BTreeMap<String, StagedFile> = BTreeMap::new();

        for rule in self.descriptor.rules() {
            if !self.ignore_formats && !rule.applies_to(&self.format) {
                tracing::debug!("Skipping rule for other formats: {:?}", rule);
                continue;
            }

            let (pattern, source_root, target) = match rule {
                IncludeRule::Package {
                    include, from, to, ..
                } => {
                    let source_root = match from {
                        Some(from) => self.descriptor.root().join(from),
                        None => self.descriptor.root().to_path_buf(),
                    };
                    (include.as_str(), source_root, to.as_deref())
                }
                IncludeRule::Path { pattern, .. } => (
                    pattern.as_str(),
                    self.descriptor.root().to_path_buf(),
                    None,
                ),
            };

            let full_pattern = source_root.join(pattern);
            for entry in glob::glob(&full_pattern.to_string_lossy())? {
                let path = entry.map_err(|e| NarError::Io(e.into_error()))?;

                if path.is_dir() {
                    for item in WalkDir::new(&path).sort_by_file_name() {
                        let item = item.map_err(std::io::Error::from)?;
                        let is_dir = item.file_type().is_dir();
                        if is_dir && !is_empty_dir(item.path()) {
                            continue;
                        }
                        self.consider(
                            item.path(),
                            is_dir,
                            &source_root,
                            target,
                            &exclusions,
                            &mut selected,
                        )?;
                    }
                } else {
                    self.consider(&path, false, &source_root, target, &exclusions, &mut selected)?;
                }
            }
        }

        Ok(selected.into_values().collect())
    }

    /// Resolve the selection and copy it into the staging directory
    ///
    /// Files are copied in sorted archive-path order, permissions preserved;
    /// empty-directory entries are created as directories. Returns the
    /// selection for downstream stages.
    pub fn stage_into(&self, staging_dir: &Path) -> NarResult<Vec<StagedFile>> {
        let selected = self.select()?;

        for file in &selected {
            let dst = join_archive_path(staging_dir, &file.archive_path);
            if file.is_dir {
                std::fs::create_dir_all(&dst)?;
                continue;
            }
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&file.source, &dst)?;
        }

        tracing::info!("Staged {} entries", selected.len());
        Ok(selected)
    }

    /// Apply exclusions to a candidate and record it in the selection
    fn consider(
        &self,
        path: &Path,
        is_dir: bool,
        source_root: &Path,
        target: Option<&Path>,
        exclusions: &[glob::Pattern],
        selected: &mut BTreeMap<String, StagedFile>,
    ) -> NarResult<()> {
        let rel = path.strip_prefix(source_root).unwrap_or(path);

        if is_cache_artifact(rel) {
            return Ok(());
        }
        if exclusions.iter().any(|p| p.matches_path(rel)) {
            tracing::debug!("Excluded: {}", rel.display());
            return Ok(());
        }

        let archive_path = match target {
            Some(target) => to_forward_slash(&target.join(rel)),
            None => to_forward_slash(rel),
        };

        match selected.get(&archive_path) {
            Some(existing) if existing.source != path => {
                return Err(NarError::PathCollision {
                    archive_path,
                    first: existing.source.clone(),
                    second: path.to_path_buf(),
                });
            }
            Some(_) => return Ok(()),
            None => {}
        }

        tracing::debug!("Adding: {}", path.display());
        selected.insert(
            archive_path.clone(),
            StagedFile {
                source: path.to_path_buf(),
                archive_path,
                is_dir,
            },
        );
        Ok(())
    }
}

/// Whether a path is a compiled/cache artifact that is never packaged
fn is_cache_artifact(rel: &Path) -> bool {
    if rel
        .components()
        .any(|c| c.as_os_str() == "__pycache__")
    {
        return true;
    }
    rel.extension().is_some_and(|e| e == "pyc")
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Convert a relative path to forward-slash notation
pub(crate) fn to_forward_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a forward-slash archive path onto a host directory
pub(crate) fn join_archive_path(base: &Path, archive_path: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for part in archive_path.split('/') {
        out.push(part);
    }
    out
}
