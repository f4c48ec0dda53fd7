// client: sending side of the file transfer
pub mod error;
pub mod source;

pub use error::*;
pub use source::SourceFile;

use ft_core::{
    FinalStatus, NameFrame, SizeFrame, Status, DEFAULT_CHUNK_SIZE, DEFAULT_PORT, MAX_CHUNK_SIZE,
};
use ft_transport::{Framed, IpFamily, SocketOptions, TcpTransport, Transport};
use log::{debug, info, warn};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub family: IpFamily,
    pub file: PathBuf,
    pub chunk_size: usize,
    pub socket: SocketOptions,
}

impl ClientConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        ClientConfig {
            host: IpFamily::V4.loopback().to_string(),
            port: DEFAULT_PORT,
            family: IpFamily::V4,
            file: file.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            socket: SocketOptions::default(),
        }
    }
}

pub struct FileSender {
    framed: Framed<Box<dyn Transport>>,
    chunk_size: usize,
}

impl FileSender {
    pub fn new(transport: Box<dyn Transport>, chunk_size: usize) -> Self {
        FileSender {
            framed: Framed::new(transport),
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
        }
    }

    pub fn connect(config: &ClientConfig) -> Result<Self, SendError> {
        let mut transport = TcpTransport::new(&config.host, config.port)
            .with_family(config.family)
            .with_options(config.socket);
        transport.connect().map_err(|source| SendError::Connect {
            addr: format!("{}:{}", config.host, config.port),
            source,
        })?;
        Ok(Self::new(Box::new(transport), config.chunk_size))
    }

    // Releases the connection on every path
    pub fn send(&mut self, source: SourceFile) -> Result<u64, SendError> {
        let result = self.exchange(source);
        let _ = self.framed.get_mut().disconnect();
        result
    }

    fn exchange(&mut self, mut source: SourceFile) -> Result<u64, SendError> {
        let size = source.size();
        debug!("announcing {:?} ({} bytes)", source.name().as_str(), size);
        self.framed.write_name(&NameFrame::new(source.name().clone()))?;

        match Status::from_bytes(&self.framed.read_status()?)? {
            Status::Accept => {}
            Status::Reject => return Err(SendError::Rejected),
        }

        self.framed.write_size(SizeFrame(size))?;

        let mut buffer = vec![0u8; self.chunk_size];
        let mut remaining = size;
        while remaining > 0 {
            let want = remaining.min(self.chunk_size as u64) as usize;
            let n = source.read(&mut buffer[..want]).map_err(SendError::Read)?;
            if n == 0 {
                return Err(SendError::SourceShrank {
                    expected: size,
                    sent: size - remaining,
                });
            }
            self.framed.write_all(&buffer[..n])?;
            remaining -= n as u64;
        }

        match FinalStatus::from_bytes(&self.framed.read_final_status()?)? {
            FinalStatus::Ack => Ok(size),
            FinalStatus::Nak => Err(SendError::Nak),
        }
    }
}

pub fn run(config: &ClientConfig) -> Result<u64, SendError> {
    let source = SourceFile::open(&config.file)?;
    let path = source.path().display().to_string();

    let mut sender = FileSender::connect(config)?;
    match sender.send(source) {
        Ok(bytes) => {
            info!("sent {} ({} bytes) to {}:{}", path, bytes, config.host, config.port);
            Ok(bytes)
        }
        Err(e) => {
            warn!("sending {} failed: {}", path, e);
            Err(e)
        }
    }
}

pub fn run_to_exit_code(config: &ClientConfig) -> ExitCode {
    match run(config) {
        Ok(_) => ExitCode::Success,
        Err(e) => e.exit_code(),
    }
}
