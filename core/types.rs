// Core types shared by the sender and the listener
use crate::error::ProtocolError;
use crate::protocol::{MAX_NAME_LEN, RECEIVED_SUFFIX};
use std::fmt;
use std::path::{Path, PathBuf};

// Base name only: no separator, newline or NUL, at most MAX_NAME_LEN bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn new(raw: &str) -> Result<Self, ProtocolError> {
        let base = raw.rsplit(['/', '\\']).next().unwrap_or("");

        if base.is_empty() {
            return Err(ProtocolError::EmptyName);
        }
        if base.len() > MAX_NAME_LEN {
            return Err(ProtocolError::NameTooLong {
                len: base.len(),
                max: MAX_NAME_LEN,
            });
        }
        if base.contains(['\n', '\0']) {
            return Err(ProtocolError::NameControlChar);
        }

        Ok(FileName(base.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NameNotUtf8)?;
        Self::new(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ProtocolError> {
        let base = path.file_name().ok_or(ProtocolError::EmptyName)?;
        let base = base.to_str().ok_or(ProtocolError::NameNotUtf8)?;
        Self::new(base)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // <outdir>/<name>-received
    pub fn destination(&self, outdir: &Path) -> PathBuf {
        outdir.join(format!("{}{}", self.0, RECEIVED_SUFFIX))
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Checkpoint status, sent once the server has evaluated the name frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Accept,
    Reject,
}

impl Status {
    pub const LEN: usize = 2;

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        match self {
            Status::Accept => *b"OK",
            Status::Reject => *b"NO",
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        match bytes {
            b"OK" => Ok(Status::Accept),
            b"NO" => Ok(Status::Reject),
            other => Err(ProtocolError::UnknownStatus(other.to_vec())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Accept => write!(f, "OK"),
            Status::Reject => write!(f, "NO"),
        }
    }
}

// Final status, sent once the payload is on disk (or the transfer failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalStatus {
    Ack,
    Nak,
}

impl FinalStatus {
    pub const LEN: usize = 3;

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        match self {
            FinalStatus::Ack => *b"ACK",
            FinalStatus::Nak => *b"NAK",
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        match bytes {
            b"ACK" => Ok(FinalStatus::Ack),
            b"NAK" => Ok(FinalStatus::Nak),
            other => Err(ProtocolError::UnknownStatus(other.to_vec())),
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FinalStatus::Ack => write!(f, "ACK"),
            FinalStatus::Nak => write!(f, "NAK"),
        }
    }
}
