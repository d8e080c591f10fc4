//! HTTP telemetry adapter.
//!
//! Implements [`TelemetrySink`] as a single `POST` of the report JSON to
//! the analytics collector, one short-lived connection per report:
//!
//! ```text
//! POST /send-time HTTP/1.1
//! Host: 3.85.208.114:5000
//! Content-Type: application/json
//! Content-Length: 35
//! Connection: close
//!
//! {"playTime":30000,"sleepTime":10000}
//! ```
//!
//! On the device the POST goes through the ESP-IDF HTTP client
//! (`EspHttpConnection` wrapped in `embedded_svc`'s `Client`); on the host a
//! plain `TcpStream` writes the same bytes so the adapter can be tested
//! against a loopback collector.  Both paths share the URL, headers and
//! body built here, and every step is bounded by the configured timeout.

#[cfg(not(target_os = "espidf"))]
use std::io::{Read, Write};
#[cfg(not(target_os = "espidf"))]
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::{client::Client as HttpClient, Method, Status},
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};
use log::{debug, info, warn};

use crate::app::ports::{DeliveryReceipt, TelemetrySink};
use crate::config::ToyConfig;
use crate::error::TelemetryError;
use crate::ledger::TelemetryReport;

/// Upper bound on how much of a response is read.
const MAX_RESPONSE_BYTES: usize = 2048;
/// Response body is logged, not parsed; keep log lines short.
const MAX_LOGGED_BODY: usize = 256;

pub struct HttpTelemetrySink {
    host: heapless::String<64>,
    port: u16,
    path: heapless::String<32>,
    timeout: Duration,
    sent: u32,
}

impl HttpTelemetrySink {
    pub fn new(host: &str, port: u16, path: &str, timeout_ms: u32) -> Result<Self, TelemetryError> {
        let mut h = heapless::String::new();
        h.push_str(host).map_err(|_| TelemetryError::InvalidAddress)?;
        let mut p = heapless::String::new();
        p.push_str(path).map_err(|_| TelemetryError::InvalidAddress)?;
        if h.is_empty() || !p.starts_with('/') {
            return Err(TelemetryError::InvalidAddress);
        }
        Ok(Self {
            host: h,
            port,
            path: p,
            timeout: Duration::from_millis(u64::from(timeout_ms.max(1))),
            sent: 0,
        })
    }

    pub fn from_config(config: &ToyConfig) -> Result<Self, TelemetryError> {
        Self::new(
            &config.telemetry_host,
            config.telemetry_port,
            &config.telemetry_path,
            config.telemetry_timeout_ms,
        )
    }

    /// Reports delivered (any HTTP status) since construction.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Collector endpoint, e.g. `http://3.85.208.114:5000/send-time`.
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    /// JSON body and its length, as sent in `Content-Length`.
    pub fn encode_body(report: &TelemetryReport) -> Result<(String, String), TelemetryError> {
        let body = serde_json::to_string(report).map_err(|_| TelemetryError::EncodeFailed)?;
        let len = body.len().to_string();
        Ok((body, len))
    }

    /// Full request bytes for one report, as the host transport writes them.
    pub fn build_request(&self, report: &TelemetryReport) -> Result<String, TelemetryError> {
        let (body, len) = Self::encode_body(report)?;
        let mut req = format!("POST {} HTTP/1.1\r\nHost: {}:{}\r\n", self.path, self.host, self.port);
        for (name, value) in request_headers(&len) {
            req.push_str(name);
            req.push_str(": ");
            req.push_str(value);
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        req.push_str(&body);
        Ok(req)
    }

    fn record(&mut self, report: &TelemetryReport, receipt: &DeliveryReceipt) {
        self.sent = self.sent.wrapping_add(1);
        info!(
            "Telemetry play={}ms sleep={}ms -> {} {}",
            report.play_time_ms, report.sleep_time_ms, receipt.status, receipt.body
        );
    }

    #[cfg(not(target_os = "espidf"))]
    fn resolve(&self) -> Result<SocketAddr, TelemetryError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| TelemetryError::InvalidAddress)?
            .next()
            .ok_or(TelemetryError::InvalidAddress)
    }
}

/// Headers every report carries, after `Host`.
pub fn request_headers(content_len: &str) -> [(&'static str, &str); 3] {
    [
        ("Content-Type", "application/json"),
        ("Content-Length", content_len),
        ("Connection", "close"),
    ]
}

/// Body text kept for the log line.
fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_LOGGED_BODY).collect()
}

/// Status code from an HTTP/1.x status line, e.g. `HTTP/1.1 200 OK`.
pub fn parse_status_line(line: &str) -> Result<u16, TelemetryError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/1.") && code.len() == 3 => {
            code.parse().map_err(|_| TelemetryError::MalformedResponse)
        }
        _ => Err(TelemetryError::MalformedResponse),
    }
}

/// Split a raw response into status and (truncated) body text.
pub fn parse_response(raw: &[u8]) -> Result<DeliveryReceipt, TelemetryError> {
    let text = String::from_utf8_lossy(raw);
    let status_line = text.lines().next().ok_or(TelemetryError::MalformedResponse)?;
    let status = parse_status_line(status_line)?;
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| truncate_body(b))
        .unwrap_or_default();
    Ok(DeliveryReceipt { status, body })
}

#[cfg(target_os = "espidf")]
impl TelemetrySink for HttpTelemetrySink {
    fn send(&mut self, report: &TelemetryReport) -> Result<DeliveryReceipt, TelemetryError> {
        let (body, len) = Self::encode_body(report)?;
        let url = self.url();

        let conf = HttpClientConfiguration {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            debug!("Telemetry client init failed: {:?}", e);
            TelemetryError::ConnectFailed
        })?;
        let mut client = HttpClient::wrap(conn);

        let headers = request_headers(&len);
        let mut request = client.request(Method::Post, &url, &headers).map_err(|e| {
            debug!("Telemetry connect to {} failed: {:?}", url, e);
            TelemetryError::ConnectFailed
        })?;
        request
            .write_all(body.as_bytes())
            .and_then(|_| request.flush())
            .map_err(|_| TelemetryError::WriteFailed)?;
        let mut response = request.submit().map_err(|e| {
            warn!("Telemetry submit failed: {:?}", e);
            TelemetryError::ReadFailed
        })?;

        let status = response.status();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 256];
        while raw.len() < MAX_RESPONSE_BYTES {
            match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => raw.extend_from_slice(&chunk[..n]),
                // The status is already in hand; a short body is fine.
                Err(e) => {
                    debug!("Telemetry body read stopped: {:?}", e);
                    break;
                }
            }
        }

        let receipt = DeliveryReceipt {
            status,
            body: truncate_body(&String::from_utf8_lossy(&raw)),
        };
        self.record(report, &receipt);
        Ok(receipt)
    }
}

/// Host transport: the same request over a raw socket.
#[cfg(not(target_os = "espidf"))]
impl TelemetrySink for HttpTelemetrySink {
    fn send(&mut self, report: &TelemetryReport) -> Result<DeliveryReceipt, TelemetryError> {
        let request = self.build_request(report)?;
        let addr = self.resolve()?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout).map_err(|e| {
            debug!("Telemetry connect to {} failed: {}", addr, e);
            TelemetryError::ConnectFailed
        })?;
        stream
            .set_write_timeout(Some(self.timeout))
            .and_then(|_| stream.set_read_timeout(Some(self.timeout)))
            .map_err(|_| TelemetryError::ConnectFailed)?;

        stream
            .write_all(request.as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|_| TelemetryError::WriteFailed)?;

        let mut raw = Vec::new();
        let limit = MAX_RESPONSE_BYTES as u64;
        if let Err(e) = Read::by_ref(&mut stream).take(limit).read_to_end(&mut raw) {
            // A timeout after the headers arrived still gives a usable status.
            if raw.is_empty() {
                warn!("Telemetry read failed: {}", e);
                return Err(TelemetryError::ReadFailed);
            }
        }

        let receipt = parse_response(&raw)?;
        self.record(report, &receipt);
        Ok(receipt)
    }
}
