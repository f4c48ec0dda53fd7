// Command line and environment configuration, resolved before any I/O
use anyhow::bail;
use clap::Parser;
use ft_client::ClientConfig;
use ft_core::{DEFAULT_CHUNK_SIZE, DEFAULT_PORT, MAX_CHUNK_SIZE};
use ft_daemon::{ReceiveOptions, ServerConfig};
use ft_transport::{IpFamily, SocketOptions};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Environment variables for tuning
// FT_CHUNK_SIZE: Payload bytes moved per read/write, at most 16 MiB (default: 8192)
// FT_SOCKET_BUFFER: SO_SNDBUF/SO_RCVBUF in bytes, 0 = OS default (default: 65536)
// FT_IO_TIMEOUT_SECS: Per-call socket timeout, unset or 0 = block forever

const DEFAULT_SOCKET_BUFFER: usize = 64 * 1024;

#[derive(Parser, Debug)]
#[command(name = "ft")]
#[command(about = "Send one file to a listening ft server over TCP", long_about = None)]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Listen for incoming files
    #[arg(long)]
    pub server: bool,

    /// Send a file (the default role)
    #[arg(long)]
    pub client: bool,

    /// Port to listen on or connect to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory received files are written into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub outdir: PathBuf,

    /// Server to connect to [default: 127.0.0.1, or ::1 with --ipv6]
    #[arg(short, long, value_name = "HOST")]
    pub connect: Option<String>,

    /// File to send
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Use IPv6 for listening and as the preferred family when connecting
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// Connections the server handles in parallel
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    pub chunk_size: usize,
    pub socket: SocketOptions,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            chunk_size: DEFAULT_CHUNK_SIZE,
            socket: SocketOptions {
                buffer_size: DEFAULT_SOCKET_BUFFER,
                io_timeout: None,
            },
        }
    }
}

impl Tuning {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let chunk_size = parse("FT_CHUNK_SIZE")
            .filter(|&n| n > 0 && n <= MAX_CHUNK_SIZE as u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let buffer_size = parse("FT_SOCKET_BUFFER")
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_SOCKET_BUFFER);

        let io_timeout = parse("FT_IO_TIMEOUT_SECS")
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        Tuning {
            chunk_size,
            socket: SocketOptions {
                buffer_size,
                io_timeout,
            },
        }
    }
}

#[derive(Debug)]
pub enum Role {
    Server(ServerConfig),
    Client(ClientConfig),
}

impl Role {
    /// `--server` wins over `--client`; no flag at all means client.
    pub fn resolve(cli: Cli, tuning: Tuning) -> anyhow::Result<Role> {
        let family = if cli.ipv6 { IpFamily::V6 } else { IpFamily::V4 };

        if cli.server {
            return Ok(Role::Server(ServerConfig {
                bind: family.unspecified(cli.port),
                workers: cli.workers.max(1),
                receive: ReceiveOptions::new(cli.outdir).with_chunk_size(tuning.chunk_size),
                socket: tuning.socket,
            }));
        }

        let Some(file) = cli.file else {
            bail!("--file is required when sending");
        };

        Ok(Role::Client(ClientConfig {
            host: cli.connect.unwrap_or_else(|| family.loopback().to_string()),
            port: cli.port,
            family,
            file,
            chunk_size: tuning.chunk_size,
            socket: tuning.socket,
        }))
    }
}
