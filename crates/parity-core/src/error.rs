use crate::transcript::Source;
use std::path::PathBuf;

/// Failures the parity pipeline distinguishes. Everything not listed here is
/// an execution error.
#[derive(Debug, thiserror::Error)]
pub enum ParityError {
    /// Backing implementation cannot be reached. Callers may degrade to a
    /// single-implementation run.
    #[error("{recorder} recorder unavailable: {reason}")]
    RecorderUnavailable { recorder: Source, reason: String },

    #[error("{recorder} recorder timed out after {timeout_ms}ms waiting on {command:?}")]
    RecorderTimeout {
        recorder: Source,
        command: String,
        timeout_ms: u64,
    },

    #[error("failed to spawn {program}: {reason}")]
    ProcessSpawn { program: String, reason: String },

    #[error("{program} would not terminate: {reason}")]
    ProcessCleanup { program: String, reason: String },

    #[error("malformed baseline at {}: {reason}", .path.display())]
    MalformedBaseline { path: PathBuf, reason: String },

    #[error("no baseline at {}", .path.display())]
    NoBaseline { path: PathBuf },

    #[error("malformed transcript: {reason}")]
    MalformedTranscript { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParityError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ParityError::RecorderTimeout { .. } => ExitStatus::Timeout,
            ParityError::NoBaseline { .. } => ExitStatus::NoBaseline,
            _ => ExitStatus::ExecutionError,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ParityError::RecorderUnavailable { .. })
    }
}

/// Process exit codes for CI. Values are stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Regression,
    NoBaseline,
    ExecutionError,
    Timeout,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Regression => 1,
            ExitStatus::NoBaseline => 2,
            ExitStatus::ExecutionError => 3,
            ExitStatus::Timeout => 4,
        }
    }

    /// Pick the exit status for an arbitrary error chain. Errors that are not
    /// a [`ParityError`] anywhere in the chain count as execution errors.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut cur: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = cur {
            if let Some(pe) = e.downcast_ref::<ParityError>() {
                return pe.exit_status();
            }
            cur = e.source();
        }
        ExitStatus::ExecutionError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Regression.code(), 1);
        assert_eq!(ExitStatus::NoBaseline.code(), 2);
        assert_eq!(ExitStatus::ExecutionError.code(), 3);
        assert_eq!(ExitStatus::Timeout.code(), 4);
    }

    #[test]
    fn error_maps_to_exit_status() {
        let timeout = ParityError::RecorderTimeout {
            recorder: Source::Reference,
            command: "n".into(),
            timeout_ms: 100,
        };
        assert_eq!(timeout.exit_status(), ExitStatus::Timeout);

        let none = ParityError::NoBaseline {
            path: PathBuf::from("b.json"),
        };
        assert_eq!(none.exit_status(), ExitStatus::NoBaseline);

        let spawn = ParityError::ProcessSpawn {
            program: "dfrotz".into(),
            reason: "not found".into(),
        };
        assert_eq!(spawn.exit_status(), ExitStatus::ExecutionError);
    }

    #[test]
    fn display_includes_path() {
        let e = ParityError::MalformedBaseline {
            path: PathBuf::from("/tmp/baseline.json"),
            reason: "missing field".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/baseline.json"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn from_error_walks_chain() {
        #[derive(Debug)]
        struct Wrapper(ParityError);
        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "wrapped")
            }
        }
        impl std::error::Error for Wrapper {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let w = Wrapper(ParityError::RecorderTimeout {
            recorder: Source::Model,
            command: "look".into(),
            timeout_ms: 5,
        });
        assert_eq!(ExitStatus::from_error(&w), ExitStatus::Timeout);

        let io = std::io::Error::other("boom");
        assert_eq!(ExitStatus::from_error(&io), ExitStatus::ExecutionError);
    }
}
