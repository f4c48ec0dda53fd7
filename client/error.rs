// Sender failures and the process exit codes they map to
use ft_core::ProtocolError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Rejected = 1,
    // Nothing was sent
    FileNotFound = 2,
    Failure = 255,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("cannot open {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("cannot announce {}: {source}", .path.display())]
    InvalidName {
        path: PathBuf,
        #[source]
        source: ProtocolError,
    },

    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("reading source failed: {0}")]
    Read(#[source] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server rejected the file")]
    Rejected,

    #[error("source shrank: announced {expected} bytes, only {sent} could be read")]
    SourceShrank { expected: u64, sent: u64 },

    #[error("server failed to store the file")]
    Nak,
}

impl SendError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SendError::FileNotFound { .. } | SendError::NotAFile(_) => ExitCode::FileNotFound,
            SendError::Rejected => ExitCode::Rejected,
            _ => ExitCode::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let not_found = SendError::FileNotFound {
            path: PathBuf::from("missing"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(not_found.exit_code().code(), 2);
        assert_eq!(SendError::NotAFile(PathBuf::from("/tmp")).exit_code().code(), 2);
        assert_eq!(SendError::Rejected.exit_code().code(), 1);
        assert_eq!(SendError::Nak.exit_code().code(), 255);
        assert_eq!(
            SendError::Transport(io::Error::from(io::ErrorKind::ConnectionReset))
                .exit_code()
                .code(),
            255
        );
        assert_eq!(
            SendError::Protocol(ProtocolError::UnknownStatus(b"??".to_vec()))
                .exit_code()
                .code(),
            255
        );
        assert_eq!(ExitCode::Success.code(), 0);
    }
}
