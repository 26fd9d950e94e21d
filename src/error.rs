use std::io;
use std::path::PathBuf;

use crate::process::ExitStatus;

/// Failures of a build, from the directory check to the final link
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to create directory `{}`", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to compile module `{module}` ({status})")]
    Compile { module: String, status: ExitStatus },

    #[error("Failed to link `{}` ({status})", .output.display())]
    Link { output: PathBuf, status: ExitStatus },

    #[error("Module `{module}` compiled but its object file `{}` is missing", .path.display())]
    MissingObject { module: String, path: PathBuf },

    #[error("Linker succeeded but the executable `{}` is missing", .path.display())]
    MissingExecutable { path: PathBuf },

    #[error("Failed to remove `{}` left by a previous build", .path.display())]
    StaleArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("No source module to build")]
    NoSources,

    #[error("Invalid module name `{0}`")]
    InvalidModule(String),

    #[error("Invalid project name `{0}`")]
    InvalidProjectName(String),
}
