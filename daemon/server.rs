// Listener: accepts connections and runs the receive exchange on each
use crate::receiver::{handle_connection, ReceiveOptions, TransferOutcome};
use crossbeam::channel::bounded;
use ft_core::DEFAULT_PORT;
use ft_transport::{IpFamily, SocketOptions, TcpTransportListener, Transport, TransportListener};
use log::{error, info, warn};
use std::io::{Error, ErrorKind, Result};
use std::net::SocketAddr;
use std::thread;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    // 1 handles connections inline
    pub workers: usize,
    pub receive: ReceiveOptions,
    pub socket: SocketOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: IpFamily::V4.unspecified(DEFAULT_PORT),
            workers: 1,
            receive: ReceiveOptions::new("."),
            socket: SocketOptions::default(),
        }
    }
}

pub struct Server<L: TransportListener> {
    listener: L,
    options: ReceiveOptions,
    workers: usize,
}

pub fn bind_tcp(config: ServerConfig) -> Result<Server<TcpTransportListener>> {
    // Created again per connection
    if let Err(e) = std::fs::create_dir_all(&config.receive.outdir) {
        warn!("cannot create {}: {}", config.receive.outdir.display(), e);
    }

    let mut listener = TcpTransportListener::new(config.bind, config.socket);
    listener.bind()?;
    info!(
        "listening on {}, writing into {}",
        listener.local_addr().unwrap_or(config.bind),
        config.receive.outdir.display()
    );

    Ok(Server::new(listener, config.receive, config.workers))
}

impl Server<TcpTransportListener> {
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }
}

impl<L> Server<L>
where
    L: TransportListener,
    L::Connection: 'static,
{
    pub fn new(listener: L, options: ReceiveOptions, workers: usize) -> Self {
        Server {
            listener,
            options,
            workers: workers.max(1),
        }
    }

    // Accept and per-connection failures are logged and reported as None
    pub fn serve_one(&mut self) -> Option<TransferOutcome> {
        match self.listener.accept() {
            Ok(conn) => handle_and_log(conn, &self.options),
            Err(e) => {
                warn!("accept failed: {}", e);
                None
            }
        }
    }

    pub fn serve(mut self) -> Result<()> {
        if self.workers == 1 {
            loop {
                self.serve_one();
            }
        }

        let (tx, rx) = bounded::<L::Connection>(self.workers);
        for i in 0..self.workers {
            let rx = rx.clone();
            let options = self.options.clone();
            thread::Builder::new()
                .name(format!("ft-worker-{}", i))
                .spawn(move || {
                    for conn in rx {
                        handle_and_log(conn, &options);
                    }
                })?;
        }
        info!("serving with {} workers", self.workers);

        loop {
            let conn = match self.listener.accept() {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };
            if tx.send(conn).is_err() {
                error!("all workers exited");
                return Err(Error::new(ErrorKind::Other, "worker pool exited"));
            }
        }
    }
}

fn handle_and_log<T: Transport>(conn: T, options: &ReceiveOptions) -> Option<TransferOutcome> {
    match handle_connection(conn, options) {
        Ok(outcome) => {
            match &outcome {
                TransferOutcome::Completed { .. } => info!("{}", outcome),
                TransferOutcome::Rejected(_) => warn!("{}", outcome),
            }
            Some(outcome)
        }
        Err(e) => {
            warn!("transfer failed: {}", e);
            None
        }
    }
}
