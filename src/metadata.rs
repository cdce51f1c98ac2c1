//! Archive metadata generation
//!
//! Populates the `META-INF` subtree of the staging area: legal-notice
//! files, readmes and the `MANIFEST.MF` identity record.

use crate::descriptor::ProjectDescriptor;
use crate::NarResult;
use chrono::Utc;
use std::path::Path;

/// Name of the metadata directory inside the archive
pub const METADATA_DIR: &str = "META-INF";

/// Name of the manifest file inside the metadata directory
pub const MANIFEST_NAME: &str = "MANIFEST.MF";

/// Manifest format version constant
const MANIFEST_VERSION: &str = "1.0";

/// Creator tag written into every manifest
const CREATED_BY: &str = "nar-pack";

/// Legal-notice files collected from the project root
const LEGAL_PATTERNS: &[&str] = &["COPYING*", "LICEN[SC]E*", "AUTHORS*", "NOTICE*"];

/// Writes the metadata subtree for one project
pub struct MetadataWriter<'a> {
    descriptor: &'a ProjectDescriptor,
}

impl<'a> MetadataWriter<'a> {
    /// Create a metadata writer for the given project
    pub fn new(descriptor: &'a ProjectDescriptor) -> Self {
        Self { descriptor }
    }

    /// Populate `META-INF` inside the staging directory
    pub fn write_into(&self, staging_dir: &Path) -> NarResult<()> {
        let metadata_dir = staging_dir.join(METADATA_DIR);
        std::fs::create_dir_all(&metadata_dir)?;

        self.copy_legal_files(&metadata_dir)?;
        self.copy_readmes(&metadata_dir)?;
        self.write_manifest(&metadata_dir)?;

        Ok(())
    }

    /// Copy legal-notice files from the project root, skipping anything
    /// that is missing or not a regular file
    fn copy_legal_files(&self, metadata_dir: &Path) -> NarResult<()> {
        for pattern in LEGAL_PATTERNS {
            let full = self.descriptor.root().join(pattern);
            for entry in glob::glob(&full.to_string_lossy())? {
                let path = entry.map_err(|e| crate::NarError::Io(e.into_error()))?;
                if !path.is_file() {
                    tracing::debug!("Skipping: {}", path.display());
                    continue;
                }
                let name = path.file_name().unwrap_or_default();
                std::fs::copy(&path, metadata_dir.join(name))?;
                tracing::debug!("Adding legal file: {}", path.display());
            }
        }
        Ok(())
    }

    /// Copy declared readme files under their basename
    fn copy_readmes(&self, metadata_dir: &Path) -> NarResult<()> {
        for readme in self.descriptor.readmes() {
            let source = self.descriptor.root().join(readme);
            if !source.is_file() {
                tracing::warn!("Readme not found, skipping: {}", source.display());
                continue;
            }
            let name = source.file_name().unwrap_or_default();
            std::fs::copy(&source, metadata_dir.join(name))?;
            tracing::debug!("Adding readme: {}", source.display());
        }
        Ok(())
    }

    /// Write the `MANIFEST.MF` identity record
    ///
    /// Line endings are always `\n` and the file is newline-terminated,
    /// independent of host conventions.
    fn write_manifest(&self, metadata_dir: &Path) -> NarResult<()> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let manifest = format!(
            "Manifest-Version: {}\n\
             Created-By: {}\n\
             Build-Timestamp: {}\n\
             Nar-Id: {}-nar\n\
             Nar-Group: {}\n\
             Nar-Version: {}\n",
            MANIFEST_VERSION,
            CREATED_BY,
            timestamp,
            self.descriptor.name(),
            self.descriptor.name(),
            self.descriptor.version(),
        );
        std::fs::write(metadata_dir.join(MANIFEST_NAME), manifest)?;
        Ok(())
    }
}
