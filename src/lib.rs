//! nar-pack - Reproducible NAR Archive Packaging
//!
//! This crate packages a Python project's distributable unit into a single
//! self-describing `.nar` archive: a zip container holding the project
//! files, a `META-INF` metadata subtree, and (when the project declares
//! runtime dependencies) a `NAR-INF/bundled-dependencies` tree with the
//! installed dependency set.
//!
//! # Pipeline
//!
//! A build runs a linear pipeline against a temporary staging directory:
//!
//! 1. **File selection** - declarative inclusion rules, evaluated against
//!    the project tree with format filtering and exclusion globs
//! 2. **Metadata generation** - legal notices, readmes and `MANIFEST.MF`
//! 3. **Dependency bundling** - `poetry export` + `pip install --target`
//!    into the staging area (only when dependencies are declared)
//! 4. **Dynamic metadata patching** - placeholder tokens rewritten with
//!    the final version and description
//! 5. **Serialization** - deterministic zip output: sorted entries,
//!    forward-slash paths, permissions normalized to `755`/`644`
//!
//! The finished archive is published into the target directory with a
//! same-filesystem rename, replacing any previous build.
//!
//! # Quick Start
//!
//! A project is described by a `nar.toml` document:
//!
//! ```toml
//! [project]
//! name = "pretty-print-json"
//! version = "1.2.3"
//! description = "Pretty print JSON files"
//! readme = "README.md"
//! dependencies = []
//!
//! [[packages]]
//! include = "pretty_print_json"
//! from = "src"
//! ```
//!
//! Building it:
//!
//! ```no_run
//! use nar_pack::{NarBuilder, ProjectDescriptor};
//!
//! # fn main() -> nar_pack::NarResult<()> {
//! let descriptor = ProjectDescriptor::from_file("nar.toml")?;
//! let archive = NarBuilder::new(descriptor).build(None)?;
//! println!("built {}", archive.display());
//! # Ok(())
//! # }
//! ```

mod archive;
mod builder;
mod deps;
mod descriptor;
mod error;
mod metadata;
mod patcher;
mod selector;

pub use archive::{normalize_permissions, write_archive};
pub use builder::{ArchiveFormat, NarBuilder};
pub use deps::{DependencyBundler, BUNDLED_DEPS_DIR, NAR_INF_DIR};
pub use descriptor::{distribution_name, DynamicPatch, IncludeRule, ProjectDescriptor};
pub use error::{NarError, NarResult};
pub use metadata::{MetadataWriter, MANIFEST_NAME, METADATA_DIR};
pub use patcher::MetadataPatcher;
pub use selector::{FileSelector, StagedFile};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
