// Server side of the transfer exchange, one instance per accepted connection
use crate::error::{ReceiveError, RejectReason, Stage};
use crate::partial::PartialFile;
use ft_core::{FileName, FinalStatus, Status, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use ft_transport::{Framed, Transport};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    pub outdir: PathBuf,
    pub chunk_size: usize,
}

impl ReceiveOptions {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        ReceiveOptions {
            outdir: outdir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }
}

#[derive(Debug)]
pub enum TransferOutcome {
    Completed { path: PathBuf, bytes: u64 },
    Rejected(RejectReason),
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransferOutcome::Completed { path, bytes } => {
                write!(f, "received {} bytes into {}", bytes, path.display())
            }
            TransferOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
        }
    }
}

// AWAIT_NAME -> AWAIT_SIZE -> RECEIVE_PAYLOAD -> DONE, or AWAIT_NAME -> DONE(rejected).
// The reserved destination travels with the state, so an error at any step
// drops it and removes the partial file.
enum State {
    AwaitName,
    AwaitSize { dest: PartialFile },
    ReceivePayload { dest: PartialFile, size: u64 },
    Done(TransferOutcome),
}

/// Runs the whole exchange on one connection and always releases it.
///
/// On failure a negative status matching the checkpoint already reached is
/// attempted (`NO` before the name was accepted, `NAK` after), then the
/// transport is disconnected regardless.
pub fn handle_connection<T: Transport>(
    transport: T,
    options: &ReceiveOptions,
) -> Result<TransferOutcome, ReceiveError> {
    let mut framed = Framed::new(transport);
    let result = run_exchange(&mut framed, options);

    if let Err(ref e) = result {
        let sent = match e.stage() {
            Stage::AwaitName => framed.write_status(Status::Reject),
            Stage::AwaitSize | Stage::ReceivePayload => framed.write_final_status(FinalStatus::Nak),
            Stage::Acknowledge => Ok(()),
        };
        if let Err(send_err) = sent {
            debug!("negative status not delivered: {}", send_err);
        }
    }

    let _ = framed.get_mut().disconnect();
    result
}

fn run_exchange<T: Transport>(
    framed: &mut Framed<T>,
    options: &ReceiveOptions,
) -> Result<TransferOutcome, ReceiveError> {
    let mut state = State::AwaitName;
    loop {
        state = match state {
            State::AwaitName => await_name(framed, &options.outdir)?,
            State::AwaitSize { dest } => await_size(framed, dest)?,
            State::ReceivePayload { dest, size } => {
                receive_payload(framed, dest, size, options.chunk_size)?
            }
            State::Done(outcome) => return Ok(outcome),
        };
    }
}

fn await_name<T: Transport>(framed: &mut Framed<T>, outdir: &Path) -> Result<State, ReceiveError> {
    let transport = |source| ReceiveError::Transport {
        stage: Stage::AwaitName,
        source,
    };

    let header = framed.read_name_header().map_err(transport)?;
    let name = match header.body_len() {
        Ok(len) => {
            let body = framed.read_name_body(len).map_err(transport)?;
            FileName::from_bytes(&body)
        }
        Err(e) => Err(e),
    };

    let name = match name {
        Ok(name) => name,
        Err(e) => return reject(framed, RejectReason::InvalidName(e)),
    };

    let path = name.destination(outdir);
    // The directory may have been removed since startup
    fs::create_dir_all(outdir).map_err(|source| ReceiveError::Storage {
        stage: Stage::AwaitName,
        path: outdir.to_path_buf(),
        source,
    })?;
    let dest = match PartialFile::create_new(path.clone()) {
        Ok(dest) => dest,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return reject(framed, RejectReason::Collision(path))
        }
        Err(source) => {
            return Err(ReceiveError::Storage {
                stage: Stage::AwaitName,
                path,
                source,
            })
        }
    };

    debug!("accepted name {:?}, reserved {}", name.as_str(), path.display());
    framed.write_status(Status::Accept).map_err(transport)?;
    Ok(State::AwaitSize { dest })
}

fn reject<T: Transport>(framed: &mut Framed<T>, reason: RejectReason) -> Result<State, ReceiveError> {
    debug!("rejecting transfer: {}", reason);
    framed
        .write_status(Status::Reject)
        .map_err(|source| ReceiveError::Transport {
            stage: Stage::AwaitName,
            source,
        })?;
    Ok(State::Done(TransferOutcome::Rejected(reason)))
}

fn await_size<T: Transport>(framed: &mut Framed<T>, dest: PartialFile) -> Result<State, ReceiveError> {
    let size = framed
        .read_size()
        .map_err(|source| ReceiveError::Transport {
            stage: Stage::AwaitSize,
            source,
        })?;
    info!("receiving {} ({} bytes)", dest.path().display(), size.0);
    Ok(State::ReceivePayload { dest, size: size.0 })
}

fn receive_payload<T: Transport>(
    framed: &mut Framed<T>,
    mut dest: PartialFile,
    size: u64,
    chunk_size: usize,
) -> Result<State, ReceiveError> {
    let mut buffer = vec![0u8; chunk_size];
    let mut remaining = size;

    while remaining > 0 {
        let want = remaining.min(chunk_size as u64) as usize;
        let n = framed
            .read_some(&mut buffer[..want])
            .map_err(|source| ReceiveError::Transport {
                stage: Stage::ReceivePayload,
                source,
            })?;
        dest.write_all(&buffer[..n])
            .map_err(|source| ReceiveError::Storage {
                stage: Stage::ReceivePayload,
                path: dest.path().to_path_buf(),
                source,
            })?;
        remaining -= n as u64;
    }

    let path = dest.path().to_path_buf();
    let path = dest.commit().map_err(|source| ReceiveError::Storage {
        stage: Stage::ReceivePayload,
        path,
        source,
    })?;

    framed
        .write_final_status(FinalStatus::Ack)
        .map_err(|source| ReceiveError::Transport {
            stage: Stage::Acknowledge,
            source,
        })?;

    Ok(State::Done(TransferOutcome::Completed { path, bytes: size }))
}
