// Transport abstraction - allows pluggable byte-stream backends
use std::io::Result;

// send/receive may move fewer bytes than asked; receive returns Ok(0) once the peer closed
pub trait Transport: Send {
    fn send(&mut self, data: &[u8]) -> Result<usize>;
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
}

pub trait TransportListener: Send {
    type Connection: Transport;

    fn bind(&mut self) -> Result<()>;
    fn accept(&mut self) -> Result<Self::Connection>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf)
    }

    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}
