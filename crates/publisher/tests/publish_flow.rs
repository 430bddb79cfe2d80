//! End-to-end publish flow against a scripted local HTTP service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clipcast_common::clock::RecordingSleeper;
use clipcast_common::config::PublishConfig;
use clipcast_common::error::ClipcastError;
use clipcast_publisher::{HttpPublishApi, PublishState, PublishStateMachine};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Script = Arc<Mutex<VecDeque<(u16, String)>>>;
type Log = Arc<Mutex<Vec<Recorded>>>;

/// Bind a local service; `script` receives its base url and returns the
/// responses to serve, in request order.
async fn start_service(script: impl FnOnce(&str) -> Vec<(u16, String)>) -> (String, Log) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let script: Script = Arc::new(Mutex::new(script(&base).into()));
    let log: Log = Arc::default();

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            handle(socket, script.clone(), server_log.clone()).await;
        }
    });

    (base, log)
}

async fn handle(mut socket: TcpStream, script: Script, log: Log) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_string();
    let target = request_line.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    log.lock().unwrap().push(Recorded {
        method,
        target,
        headers,
        body,
    });

    let (code, payload) = script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, r#"{"error":{"code":"unscripted"}}"#.to_string()));
    let response = format!(
        "HTTP/1.1 {code} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    let _ = socket.shutdown().await;
}

fn config(base: &str) -> PublishConfig {
    PublishConfig {
        base_url: format!("{base}/v2"),
        chunk_size: 8,
        request_timeout_secs: Some(5),
        ..PublishConfig::default()
    }
}

fn status(status: &str) -> (u16, String) {
    (
        200,
        format!(
            r#"{{"data":{{"status":"{status}","share_url":"https://share.example/abc"}},"error":{{"code":"ok"}}}}"#
        ),
    )
}

fn init_ok(base: &str) -> (u16, String) {
    (
        200,
        format!(
            r#"{{"data":{{"publish_id":"v_pub_abc","upload_url":"{base}/upload/abc"}},"error":{{"code":"ok","message":""}}}}"#
        ),
    )
}

fn accepted() -> (u16, String) {
    (201, String::new())
}

fn machine(base: &str, sleeper: &RecordingSleeper) -> PublishStateMachine {
    let config = config(base);
    let api = HttpPublishApi::new("secret-token", &config).unwrap();
    PublishStateMachine::new(Arc::new(api), Arc::new(sleeper.clone()), config)
}

#[tokio::test]
async fn test_publish_over_http_sends_ordered_ranges_and_polls() {
    let (base, log) = start_service(|base| {
        vec![
            init_ok(base),
            accepted(),
            accepted(),
            accepted(),
            status("PROCESSING_UPLOAD"),
            status("PROCESSING_DOWNLOAD"),
            status("PUBLISH_COMPLETE"),
        ]
    })
    .await;
    let sleeper = RecordingSleeper::new();
    let mut publisher = machine(&base, &sleeper);

    let artifact: Vec<u8> = (0u8..20).collect();
    let outcome = publisher
        .publish(&artifact, "Vì sao bầu trời màu xanh?")
        .await
        .unwrap();

    assert_eq!(outcome.publish_id, "v_pub_abc");
    assert_eq!(outcome.share_url.as_deref(), Some("https://share.example/abc"));
    assert_eq!(outcome.chunks, 3);
    assert_eq!(outcome.poll_attempts, 2);
    assert_eq!(publisher.state(), PublishState::Published);
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(10); 2]);

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 7);

    let init = &log[0];
    assert_eq!(init.method, "POST");
    assert_eq!(init.target, "/v2/post/publish/inbox/video/init/");
    assert_eq!(init.header("authorization"), Some("Bearer secret-token"));
    let body: serde_json::Value = serde_json::from_slice(&init.body).unwrap();
    assert_eq!(body["source_info"]["video_size"], 20);
    assert_eq!(body["source_info"]["chunk_size"], 8);
    assert_eq!(body["post_info"]["title"], "Vì sao bầu trời màu xanh?");

    let puts = &log[1..4];
    let ranges: Vec<&str> = puts
        .iter()
        .map(|r| r.header("content-range").unwrap())
        .collect();
    assert_eq!(ranges, vec!["bytes 0-7/20", "bytes 8-15/20", "bytes 16-19/20"]);
    assert!(puts.iter().all(|r| r.method == "PUT" && r.target == "/upload/abc"));
    assert!(puts.iter().all(|r| r.header("content-type") == Some("video/mp4")));
    let reassembled: Vec<u8> = puts.iter().flat_map(|r| r.body.clone()).collect();
    assert_eq!(reassembled, artifact);

    for request in &log[4..] {
        assert_eq!(request.method, "GET");
        assert_eq!(
            request.target,
            "/v2/post/publish/status/fetch/?publish_id=v_pub_abc"
        );
    }
}

#[tokio::test]
async fn test_http_init_error_body_is_surfaced() {
    let (base, log) = start_service(|_| {
        vec![(
            401,
            r#"{"error":{"code":"access_token_invalid","message":"token expired"}}"#.to_string(),
        )]
    })
    .await;
    let mut publisher = machine(&base, &RecordingSleeper::new());

    let err = publisher.publish(&[1, 2, 3], "t").await.unwrap_err();
    assert!(matches!(err, ClipcastError::SessionInit { .. }));
    assert!(err.to_string().contains("token expired"));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_chunk_rejection_stops_upload() {
    let (base, log) = start_service(|base| {
        vec![
            init_ok(base),
            accepted(),
            (400, r#"{"error":{"code":"invalid_range"}}"#.to_string()),
        ]
    })
    .await;
    let mut publisher = machine(&base, &RecordingSleeper::new());

    let err = publisher.publish(&[0u8; 20], "t").await.unwrap_err();
    match err {
        ClipcastError::ChunkUpload { offset, message } => {
            assert_eq!(offset, 8);
            assert!(message.contains("invalid_range"));
        }
        other => panic!("expected chunk failure, got {other:?}"),
    }
    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(publisher.state(), PublishState::Failed);
}
