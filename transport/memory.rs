// In-process transport backed by crossbeam channels
//
// Each side owns the sender towards its peer and the receiver from it.
// Dropping (or disconnecting) one side reads as EOF on the other once the
// queued bytes are drained, the same way a closed TCP stream does.
use crate::traits::Transport;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Result};

pub struct MemoryTransport {
    tx: Option<Sender<Vec<u8>>>,
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    max_io: usize,
}

impl MemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        MemoryTransport {
            tx: Some(tx),
            rx,
            pending: VecDeque::new(),
            max_io: usize::MAX,
        }
    }

    // A cap of 1 forces single-byte partial I/O
    pub fn with_max_io(mut self, max_io: usize) -> Self {
        self.max_io = max_io.max(1);
        self
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::NotConnected, "Not connected"))?;
        let n = data.len().min(self.max_io);
        if n == 0 {
            return Ok(0);
        }
        tx.send(data[..n].to_vec())
            .map_err(|_| Error::new(ErrorKind::BrokenPipe, "peer closed"))?;
        Ok(n)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending.extend(chunk),
                // Peer gone and nothing queued
                Err(_) => return Ok(0),
            }
        }

        let n = buf.len().min(self.max_io).min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn connect(&mut self) -> Result<()> {
        if self.tx.is_none() {
            return Err(Error::new(ErrorKind::NotConnected, "memory transport cannot reconnect"));
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }
}
