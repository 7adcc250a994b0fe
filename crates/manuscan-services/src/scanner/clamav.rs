use super::MalwareScanner;
use async_trait::async_trait;
use clamav_client::Tcp;
use manuscan_core::models::ScanResult;
use manuscan_core::{ScanError, ScannerConfig};
use std::path::Path;
use std::str;
use std::time::{Duration, Instant};

/// ClamAV daemon client over TCP.
///
/// Files are streamed with INSTREAM from the local path. The client's sync
/// API runs inside `spawn_blocking` under an explicit deadline.
#[derive(Clone)]
pub struct ClamAVScanner {
    host: String,
    port: u16,
    /// Timeout in seconds for each scan operation (default: 30)
    timeout_secs: u64,
}

impl ClamAVScanner {
    /// Create a new ClamAVScanner.
    ///
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    pub fn new(host: String, port: u16) -> Self {
        Self::with_timeout(host, port, 30)
    }

    /// Create with a custom scan timeout (for large manuscripts or slow ClamAV instances).
    pub fn with_timeout(host: String, port: u16, timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::with_timeout(config.host.clone(), config.port, config.timeout_secs)
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl MalwareScanner for ClamAVScanner {
    async fn scan_file(&self, path: &Path) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, path = %path.display(), "Starting ClamAV scan");

        let address = self.address();
        let file_path = path.to_path_buf();
        let timeout_secs = self.timeout_secs;

        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || {
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                clamav_client::scan_file(&file_path, connection, None)
            }),
        )
        .await;

        let response = match result {
            Ok(Ok(Ok(bytes))) => bytes,
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, host = %self.host, port = %self.port, "ClamAV scan failed");
                return Err(ScanError::Unreachable(e.to_string()));
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "ClamAV scan task panicked");
                return Err(ScanError::Task(e.to_string()));
            }
            Err(_) => {
                tracing::error!(timeout_secs, "ClamAV scan timeout");
                return Err(ScanError::TimedOut { timeout_secs });
            }
        };

        let verdict = parse_scan_response(&response)?;
        if verdict.infected {
            tracing::warn!(
                duration_ms = start.elapsed().as_millis(),
                viruses = ?verdict.viruses,
                "File scan detected virus"
            );
        } else {
            tracing::info!(
                duration_ms = start.elapsed().as_millis(),
                "File scan completed: clean"
            );
        }
        Ok(verdict)
    }

    async fn ping(&self) -> Result<(), ScanError> {
        let address = self.address();
        let timeout_secs = self.timeout_secs;

        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || {
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                clamav_client::ping(connection)
            }),
        )
        .await;

        match result {
            Ok(Ok(Ok(bytes))) => {
                let reply = str::from_utf8(&bytes).unwrap_or_default();
                if reply.trim_end_matches('\0').trim() == "PONG" {
                    Ok(())
                } else {
                    Err(ScanError::Protocol(format!("unexpected ping reply: {:?}", reply)))
                }
            }
            Ok(Ok(Err(e))) => Err(ScanError::Unreachable(e.to_string())),
            Ok(Err(e)) => Err(ScanError::Task(e.to_string())),
            Err(_) => Err(ScanError::TimedOut { timeout_secs }),
        }
    }
}

/// Interpret a clamd reply.
///
/// `stream: OK` is clean, each `stream: <name> FOUND` line contributes a threat
/// name, and anything else (including `... ERROR`) is a protocol error.
pub fn parse_scan_response(response: &[u8]) -> Result<ScanResult, ScanError> {
    let text = str::from_utf8(response)
        .map_err(|_| ScanError::Protocol("response is not valid UTF-8".to_string()))?;

    let mut viruses = Vec::new();
    let mut saw_ok = false;

    for line in text
        .split(['\0', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        let verdict = line.rsplit_once(": ").map_or(line, |(_, v)| v).trim();
        if verdict == "OK" {
            saw_ok = true;
        } else if let Some(name) = verdict.strip_suffix("FOUND") {
            let name = name.trim();
            viruses.push(if name.is_empty() { "unknown" } else { name }.to_string());
        } else {
            return Err(ScanError::Protocol(line.to_string()));
        }
    }

    if !viruses.is_empty() {
        Ok(ScanResult::infected(viruses))
    } else if saw_ok {
        Ok(ScanResult::clean())
    } else {
        Err(ScanError::Protocol("empty response".to_string()))
    }
}
