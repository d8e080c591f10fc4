//! HTTP telemetry against a loopback collector.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use cattoy::adapters::telemetry::HttpTelemetrySink;
use cattoy::app::ports::TelemetrySink;
use cattoy::error::TelemetryError;
use cattoy::ledger::TelemetryReport;

/// Accept one connection, capture the full request, answer with `response`.
fn one_shot_collector(response: &'static str) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8(raw).unwrap()
    });
    (port, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= len
}

const REPORT: TelemetryReport = TelemetryReport {
    play_time_ms: 42_000,
    sleep_time_ms: 7_500,
};

#[test]
fn posts_json_and_returns_status() {
    let (port, collector) = one_shot_collector(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{\"message\": \"Data received successfully\"}",
    );
    let mut sink = HttpTelemetrySink::new("127.0.0.1", port, "/send-time", 2_000).unwrap();

    let receipt = sink.send(&REPORT).unwrap();
    assert_eq!(receipt.status, 200);
    assert!(receipt.is_success());
    assert_eq!(receipt.body, "{\"message\": \"Data received successfully\"}");
    assert_eq!(sink.sent(), 1);

    let request = collector.join().unwrap();
    assert!(request.starts_with("POST /send-time HTTP/1.1\r\n"));
    assert!(request.contains("Content-Type: application/json\r\n"));
    assert!(request.ends_with("\r\n\r\n{\"playTime\":42000,\"sleepTime\":7500}"));
}

#[test]
fn server_error_is_still_a_delivery() {
    let (port, collector) =
        one_shot_collector("HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\n\r\n");
    let mut sink = HttpTelemetrySink::new("127.0.0.1", port, "/send-time", 2_000).unwrap();

    let receipt = sink.send(&REPORT).unwrap();
    assert_eq!(receipt.status, 500);
    assert!(!receipt.is_success());
    collector.join().unwrap();
}

#[test]
fn closed_port_is_connect_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut sink = HttpTelemetrySink::new("127.0.0.1", port, "/send-time", 500).unwrap();
    assert_eq!(sink.send(&REPORT), Err(TelemetryError::ConnectFailed));
    assert_eq!(sink.sent(), 0);
}
