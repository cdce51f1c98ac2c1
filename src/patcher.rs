//! Dynamic metadata patching
//!
//! Rewrites placeholder tokens in designated staged files with final
//! release values. Each configured patch targets one project-relative
//! path; the staged copy is rewritten in a single whole-file pass so an
//! interrupted build never leaves a half-written file behind.

use crate::descriptor::{DynamicPatch, ProjectDescriptor};
use crate::selector::{join_archive_path, StagedFile};
use crate::NarResult;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;

/// Applies the descriptor's placeholder rewrites to staged files
pub struct MetadataPatcher<'a> {
    descriptor: &'a ProjectDescriptor,
}

impl<'a> MetadataPatcher<'a> {
    /// Create a patcher for the given project
    pub fn new(descriptor: &'a ProjectDescriptor) -> Self {
        Self { descriptor }
    }

    /// Apply every configured patch against the staged selection
    ///
    /// A patch whose target path is not part of the selection is skipped
    /// with a warning; it does not fail the build.
    pub fn apply(&self, staging_dir: &Path, selected: &[StagedFile]) -> NarResult<()> {
        let patches = self.descriptor.dynamic_patches();
        if patches.is_empty() {
            return Ok(());
        }

        // Candidates in sorted source order so target resolution is
        // deterministic; first match wins.
        let mut candidates: Vec<&StagedFile> = selected.iter().filter(|f| !f.is_dir).collect();
        candidates.sort_by(|a, b| a.source.cmp(&b.source));

        for patch in &patches {
            self.apply_patch(staging_dir, &candidates, patch)?;
        }
        Ok(())
    }

    fn apply_patch(
        &self,
        staging_dir: &Path,
        candidates: &[&StagedFile],
        patch: &DynamicPatch,
    ) -> NarResult<()> {
        let root = self.descriptor.root();
        let target = candidates.iter().find(|f| {
            f.source
                .strip_prefix(root)
                .map(|rel| rel == patch.file)
                .unwrap_or(false)
        });

        let Some(target) = target else {
            tracing::warn!("File {} not found in the package", patch.file.display());
            return Ok(());
        };

        let pattern = Regex::new(&patch.pattern)?;
        let staged_path = join_archive_path(staging_dir, &target.archive_path);
        let content = std::fs::read_to_string(&staged_path)?;

        match pattern.replace(&content, regex::NoExpand(&patch.replacement)) {
            Cow::Owned(rewritten) => {
                std::fs::write(&staged_path, rewritten)?;
                tracing::debug!("Patched: {}", target.archive_path);
            }
            Cow::Borrowed(_) => {
                tracing::debug!("No placeholder in: {}", target.archive_path);
            }
        }
        Ok(())
    }
}
