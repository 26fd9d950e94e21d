use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;

use serde::Serialize;

use crate::config::FailurePolicy;
use crate::process::ExitStatus;

/// Outcome of compiling one module
#[derive(Clone, Debug, Serialize)]
pub struct UnitReport {
    pub module: String,
    pub source: PathBuf,
    pub object: PathBuf,
    pub status: ExitStatus,
}

/// Outcome of the final link step
#[derive(Clone, Debug, Serialize)]
pub struct LinkReport {
    /// Object files given to the linker, in order
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    pub status: ExitStatus,
}

/// Everything that happened during a build, written as JSON with `--report`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildReport {
    pub project_name: String,
    pub on_failure: FailurePolicy,
    /// Directories that did not exist before the build
    pub created_dirs: Vec<PathBuf>,
    pub units: Vec<UnitReport>,
    pub link: LinkReport,
    /// SHA3-256 of the executable, if the linker produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha3_256: Option<String>,
}

impl BuildReport {
    /// Returns `true` if every compile step and the link step succeeded
    pub fn succeeded(&self) -> bool {
        self.units.iter().all(|unit| unit.status.success()) && self.link.status.success()
    }

    pub fn failed_modules(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .filter(|unit| !unit.status.success())
            .map(|unit| unit.module.as_str())
    }

    /// The status of the last toolchain invocation, which is the link step.
    ///
    /// Codes that do not fit in a process exit status become `1`.
    pub fn exit_status(&self) -> u8 {
        match self.link.status.code() {
            Some(code) => u8::try_from(code).unwrap_or(1),
            None => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let encoded = serde_json::to_vec_pretty(self).context("Failed to encode the report")?;
        std::fs::write(path, encoded)
            .with_context(|| format!("Failed to write to `{}`", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use crate::config::FailurePolicy;
    use crate::process::ExitStatus;

    use super::{BuildReport, LinkReport, UnitReport};

    fn report(matrix: i32, main: i32, link: i32) -> BuildReport {
        let unit = |module: &str, code| UnitReport {
            module: module.into(),
            source: PathBuf::from(format!("src/{module}.cpp")),
            object: PathBuf::from(format!("build/{module}.o")),
            status: ExitStatus::from_code(code),
        };

        BuildReport {
            project_name: "matrix-calculator".into(),
            on_failure: FailurePolicy::Continue,
            created_dirs: vec!["build".into()],
            units: vec![unit("matrix", matrix), unit("main", main)],
            link: LinkReport {
                objects: vec!["build/matrix.o".into(), "build/main.o".into()],
                output: "bin/matrix-calculator".into(),
                status: ExitStatus::from_code(link),
            },
            sha3_256: None,
        }
    }

    #[test]
    fn test_succeeded() {
        assert!(report(0, 0, 0).succeeded());
        assert!(!report(1, 0, 0).succeeded());
        assert!(!report(0, 0, 1).succeeded());
    }

    #[test]
    fn test_failed_modules() {
        let failed: Vec<_> = report(1, 0, 0).failed_modules().map(str::to_owned).collect();
        assert_eq!(failed, ["matrix"]);
        assert_eq!(report(0, 0, 0).failed_modules().count(), 0);
    }

    #[test]
    fn test_exit_code_follows_link() {
        assert_eq!(report(1, 1, 0).exit_status(), 0);
        assert_eq!(report(0, 0, 4).exit_status(), 4);
        assert_eq!(report(0, 0, 256).exit_status(), 1);
        assert_eq!(report(0, 0, -1).exit_status(), 1);
    }

    #[test]
    fn test_json() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("report.json");
        report(2, 0, 0).write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "project-name": "matrix-calculator",
                "on-failure": "continue",
                "created-dirs": ["build"],
                "units": [
                    {
                        "module": "matrix",
                        "source": "src/matrix.cpp",
                        "object": "build/matrix.o",
                        "status": 2
                    },
                    {
                        "module": "main",
                        "source": "src/main.cpp",
                        "object": "build/main.o",
                        "status": 0
                    }
                ],
                "link": {
                    "objects": ["build/matrix.o", "build/main.o"],
                    "output": "bin/matrix-calculator",
                    "status": 0
                }
            })
        );
    }
}
