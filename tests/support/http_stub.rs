//! Minimal HTTP stub that serves a fixed sequence of responses, one request
//! per connection. Used where the retry loop must see different statuses on
//! consecutive attempts, which a mock matching on request shape cannot do.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct ScriptedServer {
    addr: SocketAddr,
    bodies: Arc<Mutex<Vec<String>>>,
    serve_task: JoinHandle<()>,
}

impl ScriptedServer {
    /// Binds an ephemeral port and answers exactly one request per scripted
    /// `(status, body)` entry, in order.
    pub async fn start(script: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub server should bind an ephemeral port");
        let addr = listener
            .local_addr()
            .expect("bound listener should report its address");

        let bodies = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&bodies);

        let serve_task = tokio::spawn(async move {
            for (status, body) in script {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request_body = read_request_body(&mut stream).await;
                recorded
                    .lock()
                    .expect("request log lock should not be poisoned")
                    .push(request_body);

                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            addr,
            bodies,
            serve_task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bodies of the requests served so far, in arrival order.
    pub fn request_bodies(&self) -> Vec<String> {
        self.bodies
            .lock()
            .expect("request log lock should not be poisoned")
            .clone()
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

async fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let read = stream.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            return String::new();
        }
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(header_end) = find_header_end(&buffer) {
            let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            let body_start = header_end + 4;
            while buffer.len() < body_start + content_length {
                let read = stream.read(&mut chunk).await.unwrap_or(0);
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);
            }

            return String::from_utf8_lossy(&buffer[body_start..]).to_string();
        }
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}
