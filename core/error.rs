// Protocol-level errors: malformed frames and unacceptable names
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("file name is empty after stripping directories")]
    EmptyName,

    #[error("file name of {len} bytes exceeds the {max} byte limit")]
    NameTooLong { len: usize, max: usize },

    #[error("file name is not valid UTF-8")]
    NameNotUtf8,

    #[error("file name contains a newline or NUL character")]
    NameControlChar,

    #[error("unexpected status token {0:?}")]
    UnknownStatus(Vec<u8>),

    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}
