// Submit module - 扫描提交

use crate::error::SubmissionError;
use crate::payload::ScanPayload;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub const SCAN_FILES_ENDPOINT: &str = "/api/scan/files";

/// 扫描服务的响应：状态码与原样转发的 JSON
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: serde_json::Value,
}

/// 扫描提交方 - 接收载荷并返回远程服务的结果
#[async_trait]
pub trait ScanSubmitter: Send + Sync {
    async fn submit(&self, payload: &ScanPayload) -> Result<SubmissionReceipt, SubmissionError>;
}

/// POSTs the payload as JSON to `{base_url}/api/scan/files`. One attempt, no
/// retry.
#[derive(Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmitter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SCAN_FILES_ENDPOINT),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScanSubmitter for HttpSubmitter {
    async fn submit(&self, payload: &ScanPayload) -> Result<SubmissionReceipt, SubmissionError> {
        tracing::info!(
            "Submitting scan {} ({} files) to {}",
            payload.scan_id,
            payload.file_count(),
            self.endpoint
        );

        let response = self.client.post(&self.endpoint).json(payload).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Scanner rejected scan {}: {}", payload.scan_id, status);
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // 非 JSON 响应按字符串转发
        let body = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => value,
            Err(_) => serde_json::Value::String(text),
        };

        Ok(SubmissionReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ContentRecord, PayloadOverrides, ProjectNaming};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// 扫描服务收到的请求：请求行与 JSON 请求体
    type Seen = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    /// 本地假扫描服务，对每个请求返回固定的状态和响应体
    async fn canned_scanner(status: &'static str, reply: &'static str) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let seen: Seen = Arc::default();

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let log = log.clone();
                tokio::spawn(async move { answer(socket, log, status, reply).await });
            }
        });

        (base_url, seen)
    }

    async fn answer(mut socket: TcpStream, log: Seen, status: &str, reply: &str) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .map(|(_, value)| value.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            let body_start = head_end + 4;
            if buf.len() < body_start + length {
                continue;
            }

            let request_line = head.lines().next().unwrap_or_default().to_string();
            let body = serde_json::from_slice(&buf[body_start..body_start + length]).unwrap();
            log.lock().unwrap().push((request_line, body));

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            return;
        }
    }

    fn payload() -> ScanPayload {
        let records = vec![ContentRecord::new("proj/main.py".to_string(), "python", "print(1)".to_string())];
        ScanPayload::build(
            records,
            &ProjectNaming::default(),
            &PayloadOverrides::default(),
            chrono::Utc::now(),
        )
    }

    fn submitter(base_url: &str) -> HttpSubmitter {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        HttpSubmitter::with_client(client, base_url)
    }

    #[test]
    fn endpoint_joins_base_url() {
        let submitter = HttpSubmitter::with_client(reqwest::Client::new(), "http://scanner:5000/");
        assert_eq!(submitter.endpoint(), "http://scanner:5000/api/scan/files");
    }

    #[tokio::test]
    async fn posts_payload_once_and_relays_json() {
        let (base_url, seen) = canned_scanner("200 OK", r#"{"summary":{"total":1}}"#).await;
        let payload = payload();

        let receipt = submitter(&base_url).submit(&payload).await.unwrap();

        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.body["summary"]["total"], 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "POST /api/scan/files HTTP/1.1");
        assert_eq!(seen[0].1["scan_id"], payload.scan_id.as_str());
        assert_eq!(seen[0].1["scan_type"], "manual");
        assert_eq!(seen[0].1["file_contents"][0]["name"], "proj/main.py");
        assert_eq!(seen[0].1["file_contents"][0]["type"], "python");
    }

    #[tokio::test]
    async fn plain_text_success_is_wrapped_as_string() {
        let (base_url, _seen) = canned_scanner("200 OK", "queued").await;

        let receipt = submitter(&base_url).submit(&payload()).await.unwrap();

        assert_eq!(receipt.body, serde_json::Value::String("queued".to_string()));
    }

    #[tokio::test]
    async fn error_status_keeps_body_and_is_not_retried() {
        let (base_url, seen) = canned_scanner("503 Service Unavailable", "scanner busy").await;

        let err = submitter(&base_url).submit(&payload()).await.unwrap_err();

        match err {
            SubmissionError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "scanner busy");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
