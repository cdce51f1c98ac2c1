//! Runtime dependency bundling
//!
//! Materializes the project's pinned runtime dependencies into the
//! `NAR-INF/bundled-dependencies` subtree of the staging area by driving
//! two external commands: the resolver export and a pip install. Both run
//! from the project root with their output captured; a non-zero exit from
//! either aborts the build.

use crate::{NarError, NarResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Directory inside the archive holding bundling metadata
pub const NAR_INF_DIR: &str = "NAR-INF";

/// Subdirectory of `NAR-INF` holding installed dependency trees
pub const BUNDLED_DEPS_DIR: &str = "bundled-dependencies";

/// Name of the pip download cache directory inside the target directory
const PIP_CACHE_DIR: &str = "pip-cache";

/// Resolves and installs runtime dependencies for one project
pub struct DependencyBundler {
    project_root: PathBuf,
    resolver_program: PathBuf,
    python_program: PathBuf,
}

impl DependencyBundler {
    /// Create a bundler rooted at the project directory
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            resolver_program: PathBuf::from("poetry"),
            python_program: PathBuf::from("python"),
        }
    }

    /// Override the resolver command used to export pinned requirements
    pub fn resolver_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.resolver_program = program.into();
        self
    }

    /// Override the Python interpreter used to run pip
    pub fn python_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.python_program = program.into();
        self
    }

    /// Export pinned requirements and install them into the staging area
    ///
    /// The download cache lives at `{target_dir}/pip-cache` and is reused
    /// across builds.
    pub fn bundle(&self, target_dir: &Path, staging_dir: &Path) -> NarResult<()> {
        // The requirements list is scoped to this call; the guard removes
        // it on drop whether or not either command succeeds.
        let requirements = tempfile::Builder::new().suffix(".txt").tempfile()?;
        let requirements_path = requirements.path().to_path_buf();

        tracing::info!("Exporting pinned requirements");
        let mut export = Command::new(&self.resolver_program);
        export.args(["export", "-f", "requirements.txt", "-o"]);
        export.arg(&requirements_path);
        self.run(export)?;

        let cache_dir = target_dir.join(PIP_CACHE_DIR);
        if !cache_dir.exists() {
            std::fs::create_dir_all(&cache_dir)?;
        }

        let deps_dir = staging_dir.join(NAR_INF_DIR).join(BUNDLED_DEPS_DIR);
        std::fs::create_dir_all(&deps_dir)?;

        tracing::info!("Installing dependencies into {}", deps_dir.display());
        let mut install = Command::new(&self.python_program);
        install.args(["-m", "pip", "install", "-r"]);
        install.arg(&requirements_path);
        install.args([
            "--upgrade",
            "--no-python-version-warning",
            "--no-input",
            "--quiet",
        ]);
        install.arg("--cache-dir");
        install.arg(&cache_dir);
        install.arg("--target");
        install.arg(&deps_dir);
        self.run(install)?;

        Ok(())
    }

    /// Run a command from the project root with output captured
    fn run(&self, mut command: Command) -> NarResult<()> {
        let rendered = render_command(&command);
        let output = command
            .current_dir(&self.project_root)
            .output()
            .map_err(|e| NarError::ExternalCommand {
                command: rendered.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarError::ExternalCommand {
                command: rendered,
                detail: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

/// Render a command line for diagnostics
fn render_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}
