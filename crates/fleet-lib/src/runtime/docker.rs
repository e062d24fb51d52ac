//! Docker Engine API client over the local Unix socket
//!
//! Talks plain HTTP/1.0 to the daemon socket: one connection per request,
//! the response is complete when the daemon closes its end. That keeps the
//! client free of connection pooling while covering everything the cache
//! engine needs (list, one-shot stats, start, stop).

use super::{ContainerRuntime, ContainerSummary, RuntimeError, StatsSample};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Production runtime client for a Docker-compatible daemon
pub struct DockerRuntime {
    socket_path: PathBuf,
}

impl DockerRuntime {
    /// Create a client for the default daemon socket
    pub fn new() -> Self {
        Self::with_socket(DEFAULT_SOCKET)
    }

    /// Create a client for a custom socket path
    pub fn with_socket(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Path of the daemon socket this client talks to
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one request and return the response body on a success status
    async fn request(&self, method: &str, path: &str) -> Result<String, RuntimeError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(RuntimeError::Connect)?;

        let request = if method == "POST" {
            format!("POST {path} HTTP/1.0\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n")
        } else {
            format!("{method} {path} HTTP/1.0\r\nHost: localhost\r\n\r\n")
        };

        let (mut reader, mut writer) = stream.into_split();
        writer
            .write_all(request.as_bytes())
            .await
            .map_err(RuntimeError::Transport)?;
        writer.shutdown().await.map_err(RuntimeError::Transport)?;

        let mut response = Vec::new();
        reader
            .read_to_end(&mut response)
            .await
            .map_err(RuntimeError::Transport)?;

        let raw = String::from_utf8_lossy(&response);
        let (status, body) = parse_response(&raw)?;
        debug!(method, path, status, "runtime request");

        // 304 from start/stop means the container is already in the
        // requested state, which is success for our purposes.
        if (200..300).contains(&status) || status == 304 {
            Ok(body.to_string())
        } else {
            Err(RuntimeError::Status {
                status,
                message: body.trim().to_string(),
            })
        }
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a raw HTTP/1.0 response into status code and body
fn parse_response(raw: &str) -> Result<(u16, &str), RuntimeError> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| RuntimeError::Protocol("missing header terminator".to_string()))?;

    let status_line = head
        .lines()
        .next()
        .ok_or_else(|| RuntimeError::Protocol("empty response".to_string()))?;

    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(RuntimeError::Protocol(format!(
            "unexpected status line: {status_line}"
        )));
    }

    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| RuntimeError::Protocol(format!("unexpected status line: {status_line}")))?;

    Ok((status, body))
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let path = if include_stopped {
            "/containers/json?all=true"
        } else {
            "/containers/json"
        };
        let body = self.request("GET", path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn container_stats(&self, id: &str) -> Result<StatsSample, RuntimeError> {
        let path = format!("/containers/{id}/stats?stream=false");
        let body = self.request("GET", &path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        let path = format!("/containers/{id}/start");
        self.request("POST", &path).await.map(|_| ())
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        let path = format!("/containers/{id}/stop");
        self.request("POST", &path).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_ok() {
        let raw = "HTTP/1.0 200 OK\r\nContent-Type: application/json\r\n\r\n[{\"Id\":\"abc\"}]";
        let (status, body) = parse_response(raw).unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, "[{\"Id\":\"abc\"}]");
    }

    #[test]
    fn test_parse_response_error_status() {
        let raw = "HTTP/1.1 404 Not Found\r\n\r\n{\"message\":\"no such container\"}";
        let (status, body) = parse_response(raw).unwrap();
        assert_eq!(status, 404);
        assert!(body.contains("no such container"));
    }

    #[test]
    fn test_parse_response_empty_body() {
        let raw = "HTTP/1.0 204 No Content\r\nServer: Docker\r\n\r\n";
        let (status, body) = parse_response(raw).unwrap();
        assert_eq!(status, 204);
        assert!(body.is_empty());
    }

    #[test]
    fn test_parse_response_missing_terminator() {
        let err = parse_response("HTTP/1.0 200 OK\r\n").unwrap_err();
        assert!(matches!(err, RuntimeError::Protocol(_)));
    }

    #[test]
    fn test_parse_response_garbage_status_line() {
        let err = parse_response("garbage\r\n\r\nbody").unwrap_err();
        assert!(matches!(err, RuntimeError::Protocol(_)));
    }

    #[test]
    fn test_summary_decodes_engine_listing() {
        let body = r#"[{
            "Id": "8dfafdbc3a40",
            "Names": ["/boring_feynman"],
            "Image": "ubuntu:latest",
            "State": "running",
            "Status": "Up 2 hours",
            "Created": 1367854155
        }]"#;
        let summaries: Vec<ContainerSummary> = serde_json::from_str(body).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "8dfafdbc3a40");
        assert_eq!(summaries[0].names, vec!["/boring_feynman"]);
        assert_eq!(summaries[0].state, "running");
    }

    #[test]
    fn test_stats_sample_tolerates_missing_fields() {
        // A paused container reports no cpu counters; decoding must not fail.
        let sample: StatsSample =
            serde_json::from_str(r#"{"memory_stats":{"usage":1024}}"#).unwrap();
        assert_eq!(sample.memory_stats.usage, 1024);
        assert_eq!(sample.memory_stats.limit, 0);
        assert_eq!(sample.cpu_stats.cpu_usage.total_usage, 0);
    }
}
