//! Process exit statuses.

use std::process::ExitCode;

use crate::ingest::IngestError;

/// How a run ended, as seen by the process supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Input exhausted and everything flushed.
    Success,
    /// The backend could not be reached or stopped accepting data.
    Transport,
    /// Bad arguments or configuration. Matches clap's own usage status.
    Usage,
    /// The wall clock could not be read.
    Clock,
    /// Standard input could not be read.
    Input,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Transport => 1,
            ExitStatus::Usage => 2,
            ExitStatus::Clock => 3,
            ExitStatus::Input => 4,
        }
    }
}

impl From<&IngestError> for ExitStatus {
    fn from(err: &IngestError) -> Self {
        match err {
            IngestError::Clock(_) => ExitStatus::Clock,
            IngestError::Transport(_) => ExitStatus::Transport,
            IngestError::Input(_) => ExitStatus::Input,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}
