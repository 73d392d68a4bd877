//! End-to-end tests of the `guac-stress` binary.

use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

fn guac_stress() -> Command {
    let mut cmd = Command::cargo_bin("guac-stress").expect("binary built");
    cmd.timeout(Duration::from_secs(10));
    cmd
}

#[test]
fn missing_protocol_is_a_configuration_error() {
    guac_stress()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--protocol"));
}

#[test]
fn connection_failure_exits_with_failure() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    guac_stress()
        .arg("--protocol=vnc")
        .arg(format!("127.0.0.1:{port}"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connection failed"));
}

#[test]
fn time_limit_reached_is_success() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    // Accept and hold the connection open without sending anything; the
    // time limit must still fire.
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(5));
        drop(stream);
    });

    guac_stress()
        .arg("--protocol=vnc")
        .arg("--time-limit=100")
        .arg(format!("127.0.0.1:{port}"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Time limit reached"));

    drop(server);
}

#[test]
fn remote_error_exits_with_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .write_all(b"5.error,18.connection refused;")
            .unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_secs(2));
        drop(stream);
    });

    guac_stress()
        .arg("--protocol=vnc")
        .arg(format!("127.0.0.1:{port}"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connection refused"));

    server.join().unwrap();
}

#[test]
fn stream_closure_exits_with_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    guac_stress()
        .arg("--protocol=vnc")
        .arg(format!("127.0.0.1:{port}"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("End of instruction stream"));

    server.join().unwrap();
}
