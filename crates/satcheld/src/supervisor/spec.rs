//! Declarative description of a single supervised process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Executable path and argument list for one dependent process.
///
/// Immutable once constructed; the bootstrap sequencer builds these from
/// validated configuration before anything is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessSpec {
    /// Builds a spec from an executable path and its arguments.
    #[must_use]
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of the executable to launch.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments handed to the executable, in order.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Short name used in logs and errors.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.program.file_name().map_or_else(
            || self.program.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}
