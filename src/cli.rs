use std::path::{Path, PathBuf};

use clap::ColorChoice;

use crate::config::{BuildConfig, FailurePolicy};

/// Type of information to print on stdout
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Print {
    /// Prints the resolved build configuration as JSON
    Config,
    /// Prints the compiler and linker commands, in the order they would run
    Commands,
}

#[derive(clap::Parser)]
#[command(name = "cppbuild", version, author, about, long_about = None)]
pub struct Args {
    /// Modules to compile, in link order (e.g., `matrix main` for `src/matrix.cpp src/main.cpp`)
    #[clap(value_name = "MODULE")]
    pub sources: Vec<String>,

    /// Name of the executable to produce
    #[clap(long, short, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Path to the JSON configuration file, relative to the build directory [default: cppbuild.json if it exists]
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run the build from this directory
    #[clap(long, short = 'C', value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Compiler used to compile and link (e.g., `g++`, `clang++`, `ccache g++`)
    #[clap(long, value_name = "PROGRAM", env = "CXX")]
    pub compiler: Option<String>,

    /// C++ language standard
    #[clap(long, value_name = "VERSION")]
    pub std: Option<String>,

    /// Optimization level
    #[clap(long, short = 'O', value_name = "LEVEL")]
    pub opt_level: Option<String>,

    /// What to do when the compiler or the linker fails
    #[clap(long, value_name = "POLICY")]
    pub on_failure: Option<FailurePolicy>,

    /// Keep compiling and link even if a step fails (same as `--on-failure continue`)
    #[clap(long, conflicts_with = "on_failure")]
    pub keep_going: bool,

    /// Print information on stdout instead of building
    #[clap(long, value_name = "INFORMATION")]
    pub print: Option<Print>,

    /// Write a JSON report of the build to this path, relative to the build directory
    #[clap(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print each command before running it
    #[clap(long, short)]
    pub verbose: bool,

    /// Color preferences for program output
    #[clap(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,
}

impl Args {
    /// Returns the directory the build runs from
    pub fn root(&self) -> &Path {
        self.directory.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Returns where to write the report, if requested
    pub fn report_path(&self) -> Option<PathBuf> {
        self.report.as_deref().map(|path| self.root().join(path))
    }

    /// Loads the configuration and applies the command line and `CXXFLAGS` on top of it
    pub fn config(&self) -> anyhow::Result<BuildConfig> {
        let cxxflags = std::env::var("CXXFLAGS").ok();

        self.config_with_flags(cxxflags.as_deref())
    }

    fn config_with_flags(&self, cxxflags: Option<&str>) -> anyhow::Result<BuildConfig> {
        let default_path = self.root().join(BuildConfig::FILE_NAME);
        let mut config = match self.config.as_deref() {
            Some(path) => BuildConfig::from_path(&self.root().join(path))?,
            None if default_path.is_file() => BuildConfig::from_path(&default_path)?,
            None => BuildConfig::default(),
        };

        if !self.sources.is_empty() {
            config.sources.clone_from(&self.sources);
        }
        if let Some(project_name) = &self.project_name {
            config.project_name.clone_from(project_name);
        }
        if let Some(compiler) = &self.compiler {
            config.compiler.clone_from(compiler);
        }
        if let Some(std) = &self.std {
            config.std.clone_from(std);
        }
        if let Some(opt_level) = &self.opt_level {
            config.opt_level.clone_from(opt_level);
        }
        if let Some(on_failure) = self.on_failure {
            config.on_failure = on_failure;
        }
        if self.keep_going {
            config.on_failure = FailurePolicy::Continue;
        }
        if let Some(cxxflags) = cxxflags {
            config
                .extra_flags
                .extend(cxxflags.split_whitespace().map(ToOwned::to_owned));
        }

        Ok(config)
    }
}
