#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

const AT_RESPONSE_NI: &str = "7E 00 05 88 01 4E 49 00 DF";
const RECEIVE_PACKET_HI: [u8; 18] = [
    0x7E, 0x00, 0x0E, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xFF, 0xFE, 0x01,
    b'h', b'i', 0x9F,
];

fn beelink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_beelink"))
        .args(args)
        .args(["--log-level", "off"])
        .output()
        .expect("beelink should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be json"))
        .collect()
}

fn temp_capture(tag: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "beelink-{tag}-{}-{}.bin",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::write(&path, bytes).expect("capture should be writable");
    path
}

#[test]
fn encode_at_prints_wire_bytes() {
    let output = beelink(&["encode", "at", "NI", "--format", "json"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["kind"], "at_command");
    assert_eq!(lines[0]["wire_hex"], "7E 00 04 08 01 4E 49 5F");
    assert_eq!(lines[0]["length"], 8);
}

#[test]
fn decode_hex_prints_at_response() {
    let output = beelink(&["decode", "--hex", AT_RESPONSE_NI, "--format", "json"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["frame_type"], 136);
    assert_eq!(lines[0]["frame_type_name"], "AT_COMMAND_RESPONSE");
    assert_eq!(lines[0]["frame_id"], 1);
    assert_eq!(lines[0]["payload_hex"], "4E 49 00");
}

#[test]
fn decode_drops_corrupt_checksum() {
    let output = beelink(&[
        "decode",
        "--hex",
        "7E 00 05 88 01 4E 49 00 DE",
        "--format",
        "json",
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn decode_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_beelink"))
        .args(["decode", "--format", "json", "--log-level", "off"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("beelink should spawn");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&RECEIVE_PACKET_HI)
        .expect("stdin should accept bytes");
    let output = child.wait_with_output().expect("beelink should exit");
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["frame_type"], 0x90);
    assert_eq!(lines[0]["source64"], "0x0000000000000001");
    assert_eq!(lines[0]["source16"], "0xFFFE");
    assert_eq!(lines[0]["payload"], "hi");
}

#[test]
fn encoded_transmit_request_decodes_without_errors() {
    let output = beelink(&[
        "encode",
        "tx",
        "--dest",
        "0x0013A20040522B6A",
        "--data",
        "hello",
        "--format",
        "raw",
    ]);
    assert!(output.status.success());
    assert_eq!(output.stdout[0], 0x7E);

    // Transmit requests are outbound only, so the decoder drops them
    // silently after a good checksum.
    let path = temp_capture("tx", &output.stdout);
    let decoded = Command::new(env!("CARGO_BIN_EXE_beelink"))
        .args(["decode", "--file"])
        .arg(&path)
        .args(["--format", "json", "--log-format", "json"])
        .output()
        .expect("beelink should run");
    let _ = std::fs::remove_file(&path);

    assert!(decoded.status.success());
    assert!(decoded.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&decoded.stderr);
    assert!(stderr.contains("\"checksum_failures\":0"));
    assert!(stderr.contains("\"ignored\":1"));
}

#[test]
fn monitor_reads_capture_until_end_of_file() {
    let mut capture = RECEIVE_PACKET_HI.to_vec();
    capture.extend_from_slice(&[0x7E, 0x00, 0x05, 0x88, 0x01, 0x4E, 0x49, 0x00, 0xDF]);
    let path = temp_capture("monitor", &capture);

    let output = Command::new(env!("CARGO_BIN_EXE_beelink"))
        .arg("monitor")
        .arg(&path)
        .args(["--format", "json", "--log-level", "off"])
        .output()
        .expect("beelink should run");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["frame_type"], 0x90);
    assert_eq!(lines[1]["frame_type"], 0x88);
}

#[test]
fn monitor_honours_count() {
    let mut capture = RECEIVE_PACKET_HI.to_vec();
    capture.extend_from_slice(&RECEIVE_PACKET_HI);
    let path = temp_capture("count", &capture);

    let output = Command::new(env!("CARGO_BIN_EXE_beelink"))
        .arg("monitor")
        .arg(&path)
        .args(["--count", "1", "--format", "json", "--log-level", "off"])
        .output()
        .expect("beelink should run");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 1);
}

#[test]
fn invalid_hex_is_a_usage_error() {
    let output = beelink(&["decode", "--hex", "7E0"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("odd number of digits"));
}

#[test]
fn oversized_at_params_are_a_usage_error() {
    let params = "00".repeat(25);
    let output = beelink(&["encode", "at", "DL", "--param", &params]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_device_is_a_transport_error() {
    let output = beelink(&["monitor", "/nonexistent/beelink-tty"]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn at_wait_times_out_on_silent_device() {
    let path = std::env::temp_dir().join(format!(
        "beelink-silent-{}-{}.fifo",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    let status = Command::new("mkfifo")
        .arg(&path)
        .status()
        .expect("mkfifo should run");
    assert!(status.success());

    let started = Instant::now();
    let mut child = Command::new(env!("CARGO_BIN_EXE_beelink"))
        .arg("at")
        .arg(&path)
        .args(["NI", "--wait", "1s", "--log-level", "off"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("beelink should spawn");

    let status = loop {
        if let Some(status) = child.try_wait().expect("child should be waitable") {
            break Some(status);
        }
        if started.elapsed() > Duration::from_secs(10) {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        std::thread::sleep(Duration::from_millis(25));
    };
    let _ = std::fs::remove_file(&path);

    let status = status.expect("at --wait should return on its own deadline");
    assert_eq!(status.code(), Some(124));
    assert!(started.elapsed() < Duration::from_secs(5));
}
