//! CLI command implementations

pub mod explain;
pub mod init;
pub mod scan;

pub use explain::ExplainArgs;
pub use init::InitArgs;
pub use scan::ScanArgs;

use std::process::ExitCode;

use clap::Subcommand;

/// How a command finished, mapped to the process exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The command ran but its result should fail the invocation.
    Failure,
}

impl From<CommandStatus> for ExitCode {
    fn from(status: CommandStatus) -> Self {
        match status {
            CommandStatus::Success => ExitCode::SUCCESS,
            CommandStatus::Failure => ExitCode::from(1),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a project and report production-readiness gaps
    Scan(ScanArgs),

    /// Show what a finding code or rule module checks
    Explain(ExplainArgs),

    /// Write a default shipcheck.toml and an empty baseline
    Init(InitArgs),
}
