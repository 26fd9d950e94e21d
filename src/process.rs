use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use itertools::Itertools;

use serde::Serialize;

/// An external command: a program and its ordered arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn arguments(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    /// Returns the path following the last `-o` argument, if any
    pub fn output_path(&self) -> Option<&Path> {
        self.args
            .iter()
            .rev()
            .tuple_windows()
            .find_map(|(value, flag)| (flag == "-o").then(|| Path::new(value)))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = std::iter::once(&self.program)
            .chain(&self.args)
            .map(|arg| arg.to_string_lossy())
            .join(" ");

        f.write_str(&line)
    }
}

/// How an external process ended: its exit code, or `None` if it was killed by a signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExitStatus(Option<i32>);

impl ExitStatus {
    #[cfg(test)]
    pub const fn from_code(code: i32) -> Self {
        Self(Some(code))
    }

    pub const fn code(self) -> Option<i32> {
        self.0
    }

    pub const fn success(self) -> bool {
        matches!(self.0, Some(0))
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self(status.code())
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by a signal"),
        }
    }
}

/// Status and captured output of a process that ran to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    #[cfg(test)]
    pub fn from_code(code: i32) -> Self {
        Self {
            status: ExitStatus::from_code(code),
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }
}

/// Runs external commands, blocking until each one exits
pub trait ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &mut R {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        (**self).run(invocation)
    }
}

/// Spawns real processes from a fixed working directory
pub struct SystemRunner {
    working_directory: PathBuf,
}

impl SystemRunner {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let output = Command::new(invocation.program())
            .args(invocation.arguments())
            .current_dir(&self.working_directory)
            .output()?;

        Ok(ProcessOutput {
            status: output.status.into(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ExitStatus, Invocation, ProcessRunner, SystemRunner};

    #[test]
    fn test_display_joins_arguments() {
        let invocation = Invocation::new("g++")
            .args(["-std=c++11", "-Wall", "-O3"])
            .arg("-c")
            .arg("src/matrix.cpp")
            .args(["-o", "build/matrix.o"]);

        assert_eq!(
            invocation.to_string(),
            "g++ -std=c++11 -Wall -O3 -c src/matrix.cpp -o build/matrix.o"
        );
    }

    #[test]
    fn test_output_path() {
        let invocation = Invocation::new("g++").args(["build/main.o", "-o", "bin/app"]);
        assert_eq!(invocation.output_path(), Some(Path::new("bin/app")));

        let invocation = Invocation::new("g++").args(["-c", "src/main.cpp"]);
        assert_eq!(invocation.output_path(), None);

        let invocation = Invocation::new("g++").arg("-o");
        assert_eq!(invocation.output_path(), None);
    }

    #[test]
    fn test_exit_status_display() {
        assert_eq!(ExitStatus::from_code(2).to_string(), "exit code 2");
        assert_eq!(ExitStatus(None).to_string(), "terminated by a signal");
        assert!(ExitStatus::from_code(0).success());
        assert!(!ExitStatus::from_code(1).success());
        assert!(!ExitStatus(None).success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code_and_output() {
        let directory = tempfile::tempdir().unwrap();
        let mut runner = SystemRunner::new(directory.path());

        let output = runner
            .run(&Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr, b"err\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_uses_working_directory() {
        let directory = tempfile::tempdir().unwrap();
        let mut runner = SystemRunner::new(directory.path());

        let output = runner
            .run(&Invocation::new("sh").args(["-c", "touch marker"]))
            .unwrap();
        assert!(output.status.success());
        assert!(directory.path().join("marker").is_file());
    }

    #[test]
    fn test_system_runner_missing_program() {
        let directory = tempfile::tempdir().unwrap();
        let mut runner = SystemRunner::new(directory.path());

        runner
            .run(&Invocation::new("cppbuild-this-program-does-not-exist"))
            .unwrap_err();
    }
}
