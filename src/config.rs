use std::path::{Path, PathBuf};

use anyhow::Context;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::unit::CompileUnit;

/// What to do when the compiler or the linker exits with a failure
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failing step and report it
    #[default]
    Abort,
    /// Report failing steps but keep compiling, then link anyway
    Continue,
}

/// Everything a build needs to know, usually read from `cppbuild.json`.
///
/// # Example
///
/// ```json
/// {
///     "project-name": "matrix-calculator",
///     "sources": ["matrix", "main"],
///     "std": "c++17",
///     "link-flags": ["-lm"]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    /// Name of the executable written to `bin_dir`
    pub project_name: String,
    /// Modules to compile, in link order
    pub sources: Vec<String>,
    pub source_dir: PathBuf,
    pub source_extension: String,
    pub object_dir: PathBuf,
    pub bin_dir: PathBuf,
    /// Directories that must exist before anything is compiled
    pub output_dirs: Vec<PathBuf>,
    /// Compiler command, split on whitespace so that launchers such as `ccache g++` work
    pub compiler: String,
    pub std: String,
    pub opt_level: String,
    pub warnings: bool,
    pub extra_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub on_failure: FailurePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_name: "matrix-calculator".into(),
            sources: vec!["matrix".into(), "main".into()],
            source_dir: "src".into(),
            source_extension: "cpp".into(),
            object_dir: "build".into(),
            bin_dir: "bin".into(),
            output_dirs: vec!["build".into(), "bin".into()],
            compiler: "g++".into(),
            std: "c++11".into(),
            opt_level: "3".into(),
            warnings: true,
            extra_flags: Vec::new(),
            link_flags: Vec::new(),
            on_failure: FailurePolicy::default(),
        }
    }
}

impl BuildConfig {
    /// Name of the configuration file looked up in the build root
    pub const FILE_NAME: &'static str = "cppbuild.json";

    /// Reads a configuration file, using default values for the missing keys
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?;

        Self::from_json(&contents).with_context(|| format!("Failed to parse `{}`", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the flags given to the compiler for every module, in order
    pub fn compiler_flags(&self) -> Vec<String> {
        let mut flags = vec![format!("-std={}", self.std)];
        if self.warnings {
            flags.push("-Wall".into());
        }
        flags.push(format!("-O{}", self.opt_level));
        flags.extend(self.extra_flags.iter().cloned());

        flags
    }

    /// Returns the directories to verify, always including the object and binary directories
    pub fn output_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = Vec::new();
        let candidates = self
            .output_dirs
            .iter()
            .chain([&self.object_dir, &self.bin_dir])
            .map(PathBuf::as_path);
        for dir in candidates {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }

        dirs
    }

    /// Derives the compile units from `sources`, keeping their order
    pub fn units(&self) -> Result<Vec<CompileUnit>, BuildError> {
        if !is_valid_name(&self.project_name) {
            return Err(BuildError::InvalidProjectName(self.project_name.clone()));
        }
        if self.sources.is_empty() {
            return Err(BuildError::NoSources);
        }

        self.sources
            .iter()
            .map(|module| {
                if !is_valid_name(module) {
                    return Err(BuildError::InvalidModule(module.clone()));
                }

                Ok(CompileUnit::new(
                    module,
                    &self.source_extension,
                    &self.source_dir,
                    &self.object_dir,
                ))
            })
            .collect()
    }

    /// Path of the final executable
    pub fn output_path(&self) -> PathBuf {
        self.bin_dir.join(format!(
            "{}{}",
            self.project_name,
            std::env::consts::EXE_SUFFIX
        ))
    }
}

/// A file name without any directory component
fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && name != ".." && name != "."
}
