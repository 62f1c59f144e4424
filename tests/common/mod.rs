// Local stand-in for the TomTom flow segment endpoint

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const FLOW_BODY: &str = r#"{
  "flowSegmentData": {
    "frc": "FRC2",
    "currentSpeed": 18,
    "freeFlowSpeed": 42,
    "currentTravelTime": 210,
    "freeFlowTravelTime": 90,
    "confidence": 0.93,
    "roadClosure": false
  }
}"#;

pub enum Behaviour {
    Respond { status: &'static str, body: String },
    Hang,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(behaviour: Behaviour) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let behaviour = Arc::new(behaviour);

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let behaviour = behaviour.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let request_line = read_request_line(&mut socket).await;
                    seen.lock().unwrap().push(request_line);

                    match behaviour.as_ref() {
                        Behaviour::Respond { status, body } => {
                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status,
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                        Behaviour::Hang => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                        }
                    }
                });
            }
        });

        StubServer { base_url, requests }
    }

    pub async fn ok(body: &str) -> StubServer {
        Self::start(Behaviour::Respond {
            status: "200 OK",
            body: body.to_string(),
        })
        .await
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request_line(socket: &mut tokio::net::TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    String::from_utf8_lossy(&request)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
