use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Makes sure each of `dirs` exists as a directory under `root`.
///
/// Missing directories are created one level at a time, like `mkdir` without `-p`:
/// a directory whose parent does not exist is an error, and so is a path taken by a file.
/// Returns the directories that had to be created, relative to `root`.
pub fn verify_dirs<I, P>(root: &Path, dirs: I) -> Result<Vec<PathBuf>, BuildError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut created = Vec::new();

    for dir in dirs {
        let dir = dir.as_ref();
        let path = root.join(dir);
        if path.is_dir() {
            continue;
        }

        std::fs::create_dir(&path).map_err(|source| BuildError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })?;
        created.push(dir.to_path_buf());
    }

    Ok(created)
}
