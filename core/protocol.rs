// File transfer wire protocol - pure data structures, no I/O
//
// <name header: 4 BE> <name: len bytes> -> <status: 2>
// <size: 8 BE> <payload: size bytes>    -> <final status: 3>
use crate::error::ProtocolError;
use crate::types::FileName;

pub const DEFAULT_PORT: u16 = 9090;
pub const MAX_NAME_LEN: usize = 4096;
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
// Upper bound for the per-connection transfer buffer
pub const MAX_CHUNK_SIZE: usize = 16 << 20;
pub const RECEIVED_SUFFIX: &str = "-received";

// Name frame header (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameHeader {
    pub len: u32,
}

impl NameHeader {
    pub const LEN: usize = 4;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.len.to_be_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::LEN {
            return None;
        }
        Some(NameHeader {
            len: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    // Refuses anything above MAX_NAME_LEN before the body is read
    pub fn body_len(&self) -> Result<usize, ProtocolError> {
        let len = self.len as usize;
        if len > MAX_NAME_LEN {
            return Err(ProtocolError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }
        Ok(len)
    }
}

// Complete name frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFrame {
    pub name: FileName,
}

impl NameFrame {
    pub fn new(name: FileName) -> Self {
        NameFrame { name }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.name.as_str().as_bytes();
        let header = NameHeader {
            len: body.len() as u32,
        };
        let mut bytes = Vec::with_capacity(NameHeader::LEN + body.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let header = NameHeader::from_bytes(bytes).ok_or(ProtocolError::Truncated {
            expected: NameHeader::LEN,
            actual: bytes.len(),
        })?;
        let len = header.body_len()?;
        let body = &bytes[NameHeader::LEN..];
        if body.len() < len {
            return Err(ProtocolError::Truncated {
                expected: NameHeader::LEN + len,
                actual: bytes.len(),
            });
        }
        Ok(NameFrame {
            name: FileName::from_bytes(&body[..len])?,
        })
    }
}

// Size frame (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFrame(pub u64);

impl SizeFrame {
    pub const LEN: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; Self::LEN] = bytes.get(..Self::LEN)?.try_into().ok()?;
        Some(SizeFrame(u64::from_be_bytes(raw)))
    }
}
