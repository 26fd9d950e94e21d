use std::path::{Path, PathBuf};

/// A module to compile: its source file and the object file it produces
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileUnit {
    module: String,
    source: PathBuf,
    object: PathBuf,
}

impl CompileUnit {
    /// Maps `module` to `<source_dir>/<module>.<extension>` and `<object_dir>/<module>.o`
    pub fn new(module: &str, extension: &str, source_dir: &Path, object_dir: &Path) -> Self {
        Self {
            module: module.to_owned(),
            source: source_dir.join(format!("{module}.{extension}")),
            object: object_dir.join(format!("{module}.o")),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn object(&self) -> &Path {
        &self.object
    }
}
