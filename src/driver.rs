use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;

use indicatif::style::TemplateError;
use indicatif::{ProgressBar, ProgressStyle};

use itertools::Itertools;

use sha3::{Digest, Sha3_256};

use crate::config::{BuildConfig, FailurePolicy};
use crate::dirs::verify_dirs;
use crate::error::BuildError;
use crate::process::{Invocation, ProcessOutput, ProcessRunner};
use crate::report::{BuildReport, LinkReport, UnitReport};
use crate::toolchain::Toolchain;
use crate::unit::CompileUnit;

/// Creates the progress bar displayed while the modules are compiled
pub fn progress_bar() -> Result<ProgressBar, TemplateError> {
    let progress = ProgressBar::new(0).with_style(
        ProgressStyle::with_template("{prefix:>12.cyan.bold} [{bar:57}] {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );
    progress.enable_steady_tick(Duration::from_millis(200));

    Ok(progress)
}

/// Compiles every module of a project, one after the other, then links them into an executable
pub struct BuildDriver<R> {
    config: BuildConfig,
    root: PathBuf,
    toolchain: Toolchain,
    runner: R,
    progress: ProgressBar,
    verbose: bool,
}

impl<R: ProcessRunner> BuildDriver<R> {
    /// Paths in `config` are relative to `root`, which is also where `runner` must run commands
    pub fn new(config: BuildConfig, root: impl Into<PathBuf>, runner: R) -> Self {
        let toolchain = Toolchain::from_config(&config);

        Self {
            config,
            root: root.into(),
            toolchain,
            runner,
            progress: ProgressBar::hidden(),
            verbose: false,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Prints each command line before running it
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns the commands a build would run, in order, without running them
    pub fn plan(&self) -> Result<Vec<Invocation>, BuildError> {
        let units = self.config.units()?;
        let link = self
            .toolchain
            .link(units.iter().map(CompileUnit::object), &self.config.output_path());

        Ok(units
            .iter()
            .map(|unit| self.toolchain.compile(unit))
            .chain([link])
            .collect())
    }

    pub fn build(&mut self) -> Result<BuildReport, BuildError> {
        let units = self.config.units()?;

        let created_dirs = verify_dirs(&self.root, self.config.output_dirs())?;
        for dir in &created_dirs {
            self.status("Creating", dir.display());
        }

        self.status(
            "Building",
            format!("{} ({})", self.config.project_name, self.root.display()),
        );

        self.progress.set_length(units.len() as u64);
        self.progress.set_prefix("Compiling");
        let compiled = self.compile_units(&units);
        self.progress.finish_and_clear();
        let compiled = compiled?;

        let link = self.link(compiled.iter().map(|unit| unit.object.clone()).collect())?;
        let sha3_256 = if link.status.success() {
            digest(&self.root.join(&link.output))
        } else {
            None
        };

        let report = BuildReport {
            project_name: self.config.project_name.clone(),
            on_failure: self.config.on_failure,
            created_dirs,
            units: compiled,
            link,
            sha3_256,
        };

        let failed = report.failed_modules().join(", ");
        if !failed.is_empty() {
            self.warn(format!("to compile {failed}"));
        }

        if report.succeeded() {
            self.status(
                "Finished",
                format!(
                    "{} ({})",
                    report.project_name,
                    report.link.output.display()
                ),
            );
        } else {
            self.progress.suspend(|| {
                eprintln!(
                    "{:>12} {} with errors, `{}` may be stale or missing",
                    style("Finished").bold().yellow(),
                    report.project_name,
                    report.link.output.display()
                );
            });
        }

        Ok(report)
    }

    /// Compiles each unit in order. Every object path is kept, even those of failed modules
    /// when failures do not abort the build.
    fn compile_units(&mut self, units: &[CompileUnit]) -> Result<Vec<UnitReport>, BuildError> {
        units
            .iter()
            .map(|unit| {
                self.progress.set_message(unit.module().to_owned());
                self.status(
                    "Compiling",
                    format!("{} ({})", unit.module(), unit.source().display()),
                );

                let abort = self.config.on_failure == FailurePolicy::Abort;
                if abort {
                    remove_stale(&self.root, unit.object())?;
                }

                let invocation = self.toolchain.compile(unit);
                let output = self.exec(&invocation)?;

                if !output.status.success() {
                    if abort {
                        return Err(BuildError::Compile {
                            module: unit.module().to_owned(),
                            status: output.status,
                        });
                    }
                } else if abort && !self.root.join(unit.object()).is_file() {
                    return Err(BuildError::MissingObject {
                        module: unit.module().to_owned(),
                        path: unit.object().to_path_buf(),
                    });
                }

                self.progress.inc(1);

                Ok(UnitReport {
                    module: unit.module().to_owned(),
                    source: unit.source().to_path_buf(),
                    object: unit.object().to_path_buf(),
                    status: output.status,
                })
            })
            .collect()
    }

    fn link(&mut self, objects: Vec<PathBuf>) -> Result<LinkReport, BuildError> {
        let output_path = self.config.output_path();
        self.status("Linking", output_path.display());

        let abort = self.config.on_failure == FailurePolicy::Abort;
        let invocation = self.toolchain.link(&objects, &output_path);
        if abort {
            if let Some(executable) = invocation.output_path() {
                remove_stale(&self.root, executable)?;
            }
        }

        let output = self.exec(&invocation)?;

        if !output.status.success() {
            if abort {
                return Err(BuildError::Link {
                    output: output_path,
                    status: output.status,
                });
            }
            self.warn(format!(
                "to link `{}` ({})",
                output_path.display(),
                output.status
            ));
        } else if abort {
            if let Some(executable) = invocation.output_path() {
                if !self.root.join(executable).is_file() {
                    return Err(BuildError::MissingExecutable {
                        path: executable.to_path_buf(),
                    });
                }
            }
        }

        Ok(LinkReport {
            objects,
            output: output_path,
            status: output.status,
        })
    }

    fn exec(&mut self, invocation: &Invocation) -> Result<ProcessOutput, BuildError> {
        if self.verbose {
            self.status("Running", format!("`{invocation}`"));
        }

        let output = self
            .runner
            .run(invocation)
            .map_err(|source| BuildError::Spawn {
                program: invocation.program().to_string_lossy().into_owned(),
                source,
            })?;

        // Compiler diagnostics go through untouched
        self.progress.suspend(|| {
            let _ = std::io::stdout().write_all(&output.stdout);
            let _ = std::io::stderr().write_all(&output.stderr);
        });

        Ok(output)
    }

    fn status(&self, verb: &str, message: impl Display) {
        self.progress
            .suspend(|| println!("{:>12} {message}", style(verb).bold().green()));
    }

    fn warn(&self, message: impl Display) {
        self.progress
            .suspend(|| eprintln!("{:>12} {message}", style("Failed").bold().yellow()));
    }
}

/// Deletes an artifact of a previous build, so that only this build can produce it
fn remove_stale(root: &Path, path: &Path) -> Result<(), BuildError> {
    match std::fs::remove_file(root.join(path)) {
        Err(source) if source.kind() != io::ErrorKind::NotFound => {
            Err(BuildError::StaleArtifact {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn digest(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;

    Some(format!("{:x}", Sha3_256::digest(bytes)))
}
