// TCP transport implementation
use crate::traits::{Transport, TransportListener};
use log::debug;
use nix::sys::socket::{setsockopt, sockopt};
use std::io::{Error, ErrorKind, Read, Result, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpFamily {
    #[default]
    V4,
    V6,
}

impl IpFamily {
    pub fn loopback(self) -> &'static str {
        match self {
            IpFamily::V4 => "127.0.0.1",
            IpFamily::V6 => "::1",
        }
    }

    pub fn unspecified(self, port: u16) -> SocketAddr {
        match self {
            IpFamily::V4 => SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            IpFamily::V6 => SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
        }
    }

    fn matches(self, addr: &SocketAddr) -> bool {
        match self {
            IpFamily::V4 => addr.is_ipv4(),
            IpFamily::V6 => addr.is_ipv6(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketOptions {
    // 0 keeps the OS default
    pub buffer_size: usize,
    // None blocks indefinitely
    pub io_timeout: Option<Duration>,
}

impl SocketOptions {
    fn apply(&self, stream: &TcpStream) -> Result<()> {
        if self.buffer_size > 0 {
            setsockopt(stream, sockopt::SndBuf, &self.buffer_size).map_err(Error::from)?;
            setsockopt(stream, sockopt::RcvBuf, &self.buffer_size).map_err(Error::from)?;
        }
        stream.set_read_timeout(self.io_timeout)?;
        stream.set_write_timeout(self.io_timeout)?;
        Ok(())
    }
}

pub struct TcpTransport {
    host: String,
    port: u16,
    family: IpFamily,
    options: SocketOptions,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        TcpTransport {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            family: IpFamily::default(),
            options: SocketOptions::default(),
            stream: None,
        }
    }

    pub fn with_family(mut self, family: IpFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_stream(stream: TcpStream, options: SocketOptions) -> Result<Self> {
        options.apply(&stream)?;
        let peer = stream.peer_addr()?;
        Ok(TcpTransport {
            host: peer.ip().to_string(),
            port: peer.port(),
            family: if peer.is_ipv6() { IpFamily::V6 } else { IpFamily::V4 },
            options,
            stream: Some(stream),
        })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    // Addresses of the configured family first, the rest as fallback
    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let (mut preferred, fallback): (Vec<_>, Vec<_>) = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .partition(|addr| self.family.matches(addr));
        preferred.extend(fallback);
        Ok(preferred)
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::NotConnected, "Not connected"))
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.stream()?.write(data)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream()?.read(buf)
    }

    fn connect(&mut self) -> Result<()> {
        let mut last_err = Error::new(
            ErrorKind::AddrNotAvailable,
            format!("{}:{} did not resolve to any address", self.host, self.port),
        );

        for addr in self.resolve()? {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    debug!("connected to {}", addr);
                    self.options.apply(&stream)?;
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    debug!("connect to {} failed: {}", addr, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stream = None;
        Ok(())
    }
}

pub struct TcpTransportListener {
    address: SocketAddr,
    options: SocketOptions,
    listener: Option<TcpListener>,
}

impl TcpTransportListener {
    pub fn new(address: SocketAddr, options: SocketOptions) -> Self {
        TcpTransportListener {
            address,
            options,
            listener: None,
        }
    }

    // Differs from the configured address when port 0 was asked for
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}

impl TransportListener for TcpTransportListener {
    type Connection = TcpTransport;

    fn bind(&mut self) -> Result<()> {
        self.listener = Some(TcpListener::bind(self.address)?);
        Ok(())
    }

    fn accept(&mut self) -> Result<TcpTransport> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::NotConnected, "Listener not bound"))?;
        let (stream, _) = listener.accept()?;
        TcpTransport::from_stream(stream, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn connect_and_exchange_over_loopback() {
        let mut listener = TcpTransportListener::new(
            IpFamily::V4.unspecified(0),
            SocketOptions {
                buffer_size: 16 * 1024,
                io_timeout: Some(Duration::from_secs(5)),
            },
        );
        listener.bind().unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let mut conn = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            let mut filled = 0;
            while filled < buf.len() {
                filled += conn.receive(&mut buf[filled..]).unwrap();
            }
            buf
        });

        let mut client = TcpTransport::new("127.0.0.1", port);
        client.connect().unwrap();
        assert!(client.peer_addr().is_some());
        assert_eq!(client.send(b"ping").unwrap(), 4);

        assert_eq!(&server.join().unwrap(), b"ping");
    }

    #[test]
    fn send_without_connect_fails() {
        let mut transport = TcpTransport::new("127.0.0.1", 1);
        let err = transport.send(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
    }

    #[test]
    fn bracketed_ipv6_host_is_accepted() {
        let transport = TcpTransport::new("[::1]", 9090).with_family(IpFamily::V6);
        let addrs = transport.resolve().unwrap();
        assert!(addrs[0].is_ipv6());
    }

    #[test]
    fn family_defaults() {
        assert_eq!(IpFamily::V4.loopback(), "127.0.0.1");
        assert_eq!(IpFamily::V6.loopback(), "::1");
        assert_eq!(IpFamily::V6.unspecified(9090).to_string(), "[::]:9090");
        assert_eq!(IpFamily::V4.unspecified(9090).to_string(), "0.0.0.0:9090");
    }
}
