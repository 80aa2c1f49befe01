use flux_rules::{HttpRuleSource, RuleSource, RuleSourceError, USER_AGENT};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

const RULES_BODY: &str = r#"{
    "status": "success",
    "data": {"groups": [
        {"name": "node", "interval": 30, "rules": [
            {"name": "HighCPU", "type": "alerting", "annotations": {"zabbix_host": "web01"}},
            {"name": "cpu:avg5m", "type": "recording"}
        ]},
        {"name": "disk", "interval": 60, "rules": [
            {"name": "DiskFull", "type": "alerting", "annotations": {"zabbix_host": "db01"}}
        ]}
    ]}
}"#;

/// 读取一个完整的 HTTP 请求头
async fn read_request_head(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// 启动一个只响应一次的 HTTP 服务
async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let head = read_request_head(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        let _ = tx.send(head);
    });

    let url = Url::parse(&format!("http://{}/api/v1/rules", addr)).unwrap();
    (url, rx)
}

#[tokio::test]
async fn test_fetch_flattens_groups_and_sends_user_agent() {
    let (url, head_rx) = serve_once("200 OK", RULES_BODY).await;
    let source = HttpRuleSource::new(url, Duration::from_secs(2)).unwrap();

    let rules = source.fetch().await.unwrap();
    let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["HighCPU", "cpu:avg5m", "DiskFull"]);

    let head = head_rx.await.unwrap().to_lowercase();
    assert!(head.starts_with("get /api/v1/rules"));
    assert!(head.contains(&format!("user-agent: {}", USER_AGENT)));
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let (url, _head_rx) = serve_once("503 Service Unavailable", "{}").await;
    let source = HttpRuleSource::new(url, Duration::from_secs(2)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, RuleSourceError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let (url, _head_rx) = serve_once("200 OK", r#"{"status": "success", "data": [1, 2]}"#).await;
    let source = HttpRuleSource::new(url, Duration::from_secs(2)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, RuleSourceError::Decode(_)));
}

#[tokio::test]
async fn test_fetch_times_out_when_server_stalls() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request_head(&mut stream).await;
        // 不返回任何响应
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(stream);
    });

    let url = Url::parse(&format!("http://{}/api/v1/rules", addr)).unwrap();
    let source = HttpRuleSource::new(url, Duration::from_millis(200)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}
