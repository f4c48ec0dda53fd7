// Per-connection failures on the listening side
use ft_core::ProtocolError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitName,
    AwaitSize,
    ReceivePayload,
    Acknowledge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::AwaitName => write!(f, "awaiting name"),
            Stage::AwaitSize => write!(f, "awaiting size"),
            Stage::ReceivePayload => write!(f, "receiving payload"),
            Stage::Acknowledge => write!(f, "acknowledging"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("transport error while {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("storage error on {}: {source}", .path.display())]
    Storage {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReceiveError {
    pub fn stage(&self) -> Stage {
        match self {
            ReceiveError::Transport { stage, .. } | ReceiveError::Storage { stage, .. } => *stage,
        }
    }
}

#[derive(Debug, Error)]
pub enum RejectReason {
    #[error("invalid name: {0}")]
    InvalidName(#[from] ProtocolError),

    #[error("{} already exists", .0.display())]
    Collision(PathBuf),
}
