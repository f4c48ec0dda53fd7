// Exact-length framing over any Transport
//
// A single `receive` never has to return a whole field: every read here
// loops until the expected number of bytes is in, or fails with
// UnexpectedEof when the peer closes early.
use crate::traits::Transport;
use ft_core::{FinalStatus, NameFrame, NameHeader, SizeFrame, Status};
use std::io::{Error, ErrorKind, Result};

pub struct Framed<T: Transport> {
    inner: T,
}

impl<T: Transport> Framed<T> {
    pub fn new(inner: T) -> Self {
        Framed { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.receive(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("connection closed after {} of {} bytes", filled, buf.len()),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // An early close is an error here, not Ok(0)
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.receive(buf) {
                Ok(0) => {
                    return Err(Error::new(
                        ErrorKind::UnexpectedEof,
                        "connection closed mid-payload",
                    ))
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            match self.inner.send(data) {
                Ok(0) => {
                    return Err(Error::new(
                        ErrorKind::WriteZero,
                        "transport accepted no bytes",
                    ))
                }
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_name_header(&mut self) -> Result<NameHeader> {
        let bytes = self.read_array::<{ NameHeader::LEN }>()?;
        Ok(NameHeader {
            len: u32::from_be_bytes(bytes),
        })
    }

    pub fn read_name_body(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut body = vec![0u8; len];
        self.read_exact(&mut body)?;
        Ok(body)
    }

    pub fn write_name(&mut self, frame: &NameFrame) -> Result<()> {
        self.write_all(&frame.to_bytes())
    }

    pub fn read_size(&mut self) -> Result<SizeFrame> {
        let bytes = self.read_array::<{ SizeFrame::LEN }>()?;
        Ok(SizeFrame(u64::from_be_bytes(bytes)))
    }

    pub fn write_size(&mut self, size: SizeFrame) -> Result<()> {
        self.write_all(&size.to_bytes())
    }

    // Left undecoded so an unknown token surfaces as a protocol error
    pub fn read_status(&mut self) -> Result<[u8; Status::LEN]> {
        self.read_array::<{ Status::LEN }>()
    }

    pub fn write_status(&mut self, status: Status) -> Result<()> {
        self.write_all(&status.to_bytes())
    }

    pub fn read_final_status(&mut self) -> Result<[u8; FinalStatus::LEN]> {
        self.read_array::<{ FinalStatus::LEN }>()
    }

    pub fn write_final_status(&mut self, status: FinalStatus) -> Result<()> {
        self.write_all(&status.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use ft_core::FileName;
    use std::thread;

    fn trickle_pair() -> (Framed<MemoryTransport>, Framed<MemoryTransport>) {
        let (a, b) = MemoryTransport::pair();
        (
            Framed::new(a.with_max_io(1)),
            Framed::new(b.with_max_io(1)),
        )
    }

    #[test]
    fn frames_survive_single_byte_io() {
        let (mut tx, mut rx) = trickle_pair();
        let frame = NameFrame::new(FileName::new("dir/data.bin").unwrap());

        let writer = thread::spawn(move || {
            tx.write_name(&frame).unwrap();
            tx.write_size(SizeFrame(1 << 40)).unwrap();
            tx.write_status(Status::Reject).unwrap();
            tx.write_final_status(FinalStatus::Ack).unwrap();
        });

        let header = rx.read_name_header().unwrap();
        let body = rx.read_name_body(header.body_len().unwrap()).unwrap();
        assert_eq!(body, b"data.bin");
        assert_eq!(rx.read_size().unwrap(), SizeFrame(1 << 40));
        assert_eq!(Status::from_bytes(&rx.read_status().unwrap()), Ok(Status::Reject));
        assert_eq!(
            FinalStatus::from_bytes(&rx.read_final_status().unwrap()),
            Ok(FinalStatus::Ack)
        );

        writer.join().unwrap();
    }

    #[test]
    fn early_close_is_unexpected_eof() {
        let (mut tx, mut rx) = trickle_pair();
        tx.write_all(&[0, 0, 0]).unwrap();
        drop(tx);

        let err = rx.read_size().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("3 of 8"));
    }

    #[test]
    fn read_some_reports_close() {
        let (tx, mut rx) = trickle_pair();
        drop(tx);
        let mut buf = [0u8; 16];
        assert_eq!(
            rx.read_some(&mut buf).unwrap_err().kind(),
            ErrorKind::UnexpectedEof
        );
    }
}
