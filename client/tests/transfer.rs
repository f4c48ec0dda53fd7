// End-to-end transfers between the client and a live listener
use ft_client::{run, run_to_exit_code, ClientConfig, ExitCode, FileSender, SendError, SourceFile};
use ft_daemon::{bind_tcp, handle_connection, ReceiveOptions, ServerConfig, TransferOutcome};
use ft_transport::{MemoryTransport, SocketOptions};
use rstest::rstest;
use std::fs;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::thread;

fn start_server(outdir: &Path) -> SocketAddr {
    let config = ServerConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        workers: 1,
        receive: ReceiveOptions::new(outdir),
        socket: SocketOptions::default(),
    };
    let server = bind_tcp(config).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.serve());
    addr
}

fn config_for(addr: SocketAddr, file: &Path) -> ClientConfig {
    let mut config = ClientConfig::new(file);
    config.host = addr.ip().to_string();
    config.port = addr.port();
    config
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn write_source(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[rstest]
#[case::empty(0)]
#[case::one_byte(1)]
#[case::just_under_chunk(8191)]
#[case::exact_chunk(8192)]
#[case::just_over_chunk(8193)]
#[case::several_megabytes(3 * 1024 * 1024 + 17)]
fn round_trip_is_byte_identical(#[case] len: usize) {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let addr = start_server(out.path());

    let content = pattern(len);
    let path = write_source(src.path(), "payload.bin", &content);

    assert_eq!(run(&config_for(addr, &path)).unwrap(), len as u64);
    assert_eq!(fs::read(out.path().join("payload.bin-received")).unwrap(), content);
    // Source untouched
    assert_eq!(fs::read(&path).unwrap(), content);
}

#[test]
fn existing_destination_is_rejected() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let addr = start_server(out.path());

    let existing = out.path().join("report.csv-received");
    fs::write(&existing, b"keep me").unwrap();
    let path = write_source(src.path(), "report.csv", b"new,data\n");

    assert_eq!(run_to_exit_code(&config_for(addr, &path)), ExitCode::Rejected);
    assert_eq!(fs::read(&existing).unwrap(), b"keep me");
}

#[test]
fn second_send_of_same_name_is_rejected() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let addr = start_server(out.path());
    let path = write_source(src.path(), "once.txt", b"first");

    assert_eq!(run_to_exit_code(&config_for(addr, &path)), ExitCode::Success);
    fs::write(&path, b"second").unwrap();
    assert_eq!(run_to_exit_code(&config_for(addr, &path)), ExitCode::Rejected);
    assert_eq!(fs::read(out.path().join("once.txt-received")).unwrap(), b"first");
}

#[test]
fn consecutive_transfers_are_independent() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let addr = start_server(out.path());

    let a = write_source(src.path(), "a.txt", b"alpha");
    let b = write_source(src.path(), "b.txt", &pattern(20_000));

    assert_eq!(run_to_exit_code(&config_for(addr, &a)), ExitCode::Success);
    assert_eq!(run_to_exit_code(&config_for(addr, &b)), ExitCode::Success);

    assert_eq!(fs::read(out.path().join("a.txt-received")).unwrap(), b"alpha");
    assert_eq!(fs::read(out.path().join("b.txt-received")).unwrap(), pattern(20_000));
}

#[test]
fn directory_prefix_is_stripped() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let addr = start_server(out.path());

    fs::create_dir(src.path().join("deep")).unwrap();
    let path = write_source(&src.path().join("deep"), "leaf.txt", b"leaf");

    assert_eq!(run_to_exit_code(&config_for(addr, &path)), ExitCode::Success);
    assert_eq!(fs::read(out.path().join("leaf.txt-received")).unwrap(), b"leaf");
}

#[test]
fn missing_file_fails_without_connecting() {
    let src = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let config = config_for(addr, &src.path().join("absent.txt"));
    let err = run(&config).unwrap_err();
    assert!(matches!(err, SendError::FileNotFound { .. }));
    assert_eq!(err.exit_code(), ExitCode::FileNotFound);
    assert_eq!(run_to_exit_code(&config).code(), 2);

    assert_eq!(listener.accept().unwrap_err().kind(), ErrorKind::WouldBlock);
}

#[test]
fn unreachable_server_is_a_generic_failure() {
    let src = tempfile::tempdir().unwrap();
    let path = write_source(src.path(), "x.txt", b"x");

    // Bind then drop to get a port nobody listens on
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

    let err = run(&config_for(addr, &path)).unwrap_err();
    assert!(matches!(err, SendError::Connect { .. }));
    assert_eq!(err.exit_code().code(), 255);
}

#[test]
fn single_byte_io_on_both_sides() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let content = pattern(3000);
    let path = write_source(src.path(), "trickle.bin", &content);

    let (client, server) = MemoryTransport::pair();
    let options = ReceiveOptions::new(out.path()).with_chunk_size(64);
    let receiver = thread::spawn(move || handle_connection(server.with_max_io(1), &options));

    let mut sender = FileSender::new(Box::new(client.with_max_io(1)), 100);
    assert_eq!(sender.send(SourceFile::open(&path).unwrap()).unwrap(), 3000);

    match receiver.join().unwrap().unwrap() {
        TransferOutcome::Completed { path, bytes } => {
            assert_eq!(bytes, 3000);
            assert_eq!(fs::read(path).unwrap(), content);
        }
        other => panic!("unexpected outcome: {}", other),
    }
}
