// Transport module: byte-stream backends and exact-length framing on top of them
pub mod traits;
pub mod tcp;
pub mod memory;
pub mod framed;

pub use traits::*;
pub use tcp::*;
pub use memory::*;
pub use framed::*;
