use std::path::Path;

use crate::config::BuildConfig;
use crate::process::Invocation;
use crate::unit::CompileUnit;

/// Wrapper around the C++ compiler driver, used both to compile and to link
#[derive(Clone, Debug)]
pub struct Toolchain {
    /// Program followed by its leading arguments (e.g., `ccache g++`)
    command: Vec<String>,
    compile_flags: Vec<String>,
    link_flags: Vec<String>,
}

impl Toolchain {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            command: config
                .compiler
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect(),
            compile_flags: config.compiler_flags(),
            link_flags: config.link_flags.clone(),
        }
    }

    fn command(&self) -> Invocation {
        let mut command = self.command.iter();
        // An empty compiler string yields an empty program, which fails to spawn
        let program = command.next().map(String::as_str).unwrap_or_default();

        Invocation::new(program).args(command)
    }

    /// `<compiler> <flags...> -c <source> -o <object>`
    pub fn compile(&self, unit: &CompileUnit) -> Invocation {
        self.command()
            .args(&self.compile_flags)
            .arg("-c")
            .arg(unit.source())
            .arg("-o")
            .arg(unit.object())
    }

    /// `<compiler> <objects...> <link flags...> -o <output>`
    pub fn link<I, P>(&self, objects: I, output: &Path) -> Invocation
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.command()
            .args(objects.into_iter().map(|object| object.as_ref().as_os_str().to_owned()))
            .args(&self.link_flags)
            .arg("-o")
            .arg(output)
    }
}
