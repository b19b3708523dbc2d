#![allow(dead_code)]

use serde_json::Value;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};
use tp2bmc_console::{
    notification::{Toast, Toaster},
    render::{Alert, Renderer},
};

/// Canned reply of the mock device
#[derive(Clone)]
pub struct Reply {
    pub status: &'static str,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            status: "200 OK",
            body: r#"{"node":[{"result":"ok"}]}"#.to_string(),
            delay: Some(delay),
        }
    }
}

/// Request line and body of every request the mock device received
pub type Requests = Arc<Mutex<Vec<(String, String)>>>;

/// Mock device answering every request with `reply`
pub async fn start_mock_device(reply: Reply) -> (SocketAddr, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock device");
    let addr = listener.local_addr().expect("failed to get local address");
    let requests: Requests = Arc::default();
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let reply = reply.clone();
            let seen = Arc::clone(&seen);

            tokio::spawn(async move {
                let mut reader = BufReader::new(&mut stream);
                let mut request_line = String::new();
                let mut content_length = 0usize;

                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }

                // Read HTTP headers
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.is_err() {
                        return;
                    }
                    if line.trim().is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }

                let mut body = vec![0; content_length];
                if reader.read_exact(&mut body).await.is_err() {
                    return;
                }

                seen.lock().unwrap().push((
                    request_line.trim().to_string(),
                    String::from_utf8_lossy(&body).into_owned(),
                ));

                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }

                let http_response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reply.body.len(),
                    reply.body
                );

                let _ = stream.write_all(http_response.as_bytes()).await;
            });
        }
    });

    (addr, requests)
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub payloads: Arc<Mutex<Vec<Value>>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, payload: &Value) {
        self.payloads.lock().unwrap().push(payload.clone());
    }
}

#[derive(Clone, Default)]
pub struct RecordingAlert {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl Alert for RecordingAlert {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Clone, Default)]
pub struct RecordingToaster {
    pub toasts: Arc<Mutex<Vec<Toast>>>,
}

impl Toaster for RecordingToaster {
    fn send(&self, toast: &Toast) {
        self.toasts.lock().unwrap().push(toast.clone());
    }
}
