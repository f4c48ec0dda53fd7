// Core module: Protocol definitions and types (NO I/O dependencies)
pub mod error;
pub mod types;
pub mod protocol;

pub use error::*;
pub use types::*;
pub use protocol::*;
