// daemon: listening side of the file transfer
pub mod error;
pub mod partial;
pub mod receiver;
pub mod server;

pub use error::*;
pub use partial::PartialFile;
pub use receiver::*;
pub use server::*;
