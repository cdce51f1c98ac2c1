//! Archive build orchestration
//!
//! Sequences selection, metadata generation, dependency bundling, dynamic
//! patching and serialization against a temporary staging area, then
//! publishes the finished archive atomically into the target directory.

use crate::archive::write_archive;
use crate::deps::DependencyBundler;
use crate::descriptor::{distribution_name, ProjectDescriptor};
use crate::metadata::MetadataWriter;
use crate::patcher::MetadataPatcher;
use crate::selector::FileSelector;
use crate::{NarError, NarResult};
use std::path::{Path, PathBuf};

/// Default target directory, relative to the project root
const DEFAULT_TARGET_DIR: &str = "dist";

/// Archive formats this crate can build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// The self-describing nar zip container
    Nar,
}

impl ArchiveFormat {
    /// Map a format identifier to a format
    ///
    /// Unrecognized identifiers are a configuration error; there is no
    /// builder registry behind this.
    pub fn from_identifier(id: &str) -> NarResult<Self> {
        match id {
            "nar" => Ok(ArchiveFormat::Nar),
            other => Err(NarError::UnknownFormat(other.to_string())),
        }
    }

    /// Identifier used in inclusion-rule format lists
    pub fn identifier(self) -> &'static str {
        match self {
            ArchiveFormat::Nar => "nar",
        }
    }

    /// File extension of the produced archive
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Nar => "nar",
        }
    }
}

/// Builds a nar archive from a project descriptor
#[derive(Debug)]
pub struct NarBuilder {
    descriptor: ProjectDescriptor,
    format: ArchiveFormat,
    ignore_formats: bool,
    resolver_program: PathBuf,
    python_program: PathBuf,
}

impl NarBuilder {
    /// Create a builder for the nar format
    pub fn new(descriptor: ProjectDescriptor) -> Self {
        Self {
            descriptor,
            format: ArchiveFormat::Nar,
            ignore_formats: false,
            resolver_program: PathBuf::from("poetry"),
            python_program: PathBuf::from("python"),
        }
    }

    /// Select a builder by format identifier
    pub fn for_format(descriptor: ProjectDescriptor, id: &str) -> NarResult<Self> {
        let format = ArchiveFormat::from_identifier(id)?;
        let mut builder = Self::new(descriptor);
        builder.format = format;
        Ok(builder)
    }

    /// Disable inclusion-rule format filtering
    pub fn ignore_formats(mut self, ignore: bool) -> Self {
        self.ignore_formats = ignore;
        self
    }

    /// Override the resolver command used for dependency export
    pub fn resolver_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.resolver_program = program.into();
        self
    }

    /// Override the Python interpreter used for dependency installs
    pub fn python_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.python_program = program.into();
        self
    }

    /// File name of the archive this builder produces
    pub fn filename(&self) -> String {
        format!(
            "{}-{}.{}",
            distribution_name(self.descriptor.name()),
            self.descriptor.version(),
            self.format.extension()
        )
    }

    /// Target directory used when `build` is called without one
    pub fn default_target_dir(&self) -> PathBuf {
        self.descriptor.root().join(DEFAULT_TARGET_DIR)
    }

    /// Build the archive and return its final path
    ///
    /// The staging directory and the archive-in-progress are drop-guarded
    /// temporaries, so they are removed on every exit path; the finished
    /// archive reaches the target path through a same-filesystem rename,
    /// replacing any previous archive of the same name.
    pub fn build(&self, target_dir: Option<&Path>) -> NarResult<PathBuf> {
        tracing::info!("Building {}", self.format.identifier());

        let target_dir = match target_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.default_target_dir(),
        };
        if !target_dir.exists() {
            std::fs::create_dir_all(&target_dir)?;
        }

        let staging = tempfile::Builder::new()
            .prefix(self.descriptor.name())
            .tempdir()?;

        // Created inside the target directory so the final persist is a
        // rename, never a byte copy across filesystems.
        let archive_file = tempfile::Builder::new()
            .prefix(".nar-")
            .suffix(".tmp")
            .tempfile_in(&target_dir)?;

        let selector =
            FileSelector::new(&self.descriptor, self.format.identifier())
                .ignore_formats(self.ignore_formats);
        let selected = selector.stage_into(staging.path())?;

        MetadataWriter::new(&self.descriptor).write_into(staging.path())?;

        if self.descriptor.has_dependencies() {
            DependencyBundler::new(self.descriptor.root())
                .resolver_program(&self.resolver_program)
                .python_program(&self.python_program)
                .bundle(&target_dir, staging.path())?;
        }

        MetadataPatcher::new(&self.descriptor).apply(staging.path(), &selected)?;

        let archive_file = write_archive(staging.path(), archive_file)?;

        let target = target_dir.join(self.filename());
        if target.exists() {
            std::fs::remove_file(&target)?;
        }
        archive_file
            .persist(&target)
            .map_err(|e| NarError::Io(e.error))?;

        tracing::info!("Built {}", self.filename());
        Ok(target)
    }
}
