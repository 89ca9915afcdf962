use migdash::api::DashboardClient;
use migdash::error::ApiError;
use migdash::models::{TeeOperation, TeeOperationRequest};
use mockito::Server;
use serde_json::json;

#[tokio::test]
async fn test_get_pods() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/k8s/pods/cluster1/default")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({
            "pods": [
                {"podName": "web-0", "appName": "web", "status": "Running", "age": "3m"},
                {"podName": "db-0", "appName": "db", "status": "Pending", "age": "1m", "reason": "ContainerCreating"}
            ]
        }).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let pods = client.get_pods("cluster1", "default").await.unwrap();

    mock.assert_async().await;
    assert_eq!(pods.len(), 2);
    assert_eq!(pods[0].pod_name, "web-0");
    assert!(pods[0].is_running());
    assert_eq!(pods[1].reason.as_deref(), Some("ContainerCreating"));
}

#[tokio::test]
async fn test_server_error_carries_detail() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/k8s/pods/cluster2/default")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"detail": "Error fetching pods: cluster unreachable"}).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let err = client.get_pods("cluster2", "default").await.unwrap_err();

    match &err {
        ApiError::Server { status, detail } => {
            assert_eq!(*status, 500);
            assert_eq!(detail, "Error fetching pods: cluster unreachable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.detail(), "Error fetching pods: cluster unreachable");
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let mut server = Server::new_async().await;
    server.mock("DELETE", "/k8s/pods/cluster1/default/web-0")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let err = client.delete_pod("cluster1", "default", "web-0").await.unwrap_err();
    assert_eq!(err.detail(), "Bad Gateway");
}

#[tokio::test]
async fn test_containers_are_merged_normal_first() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/tee-operation/containers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({
            "normal_containers": [
                {"containerName": "nginx", "containerID": "a1", "image": "nginx:latest", "status": "Up 2 hours", "environment": "Normal"}
            ],
            "sevsnp_containers": [
                {"containerName": "redis", "containerID": "b2", "image": "redis:7", "status": "Up 5 minutes", "environment": "SEV-SNP"}
            ]
        }).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let containers = client.get_podman_containers().await.unwrap();
    assert_eq!(containers.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["nginx", "redis"]);
    assert!(containers[1].is_sev_snp());
}

#[tokio::test]
async fn test_container_listing_error_field_is_a_failure() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/tee-operation/containers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"normal_containers": [], "sevsnp_containers": [], "error": "Unexpected error: ssh timeout"}).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let err = client.get_podman_containers().await.unwrap_err();
    assert_eq!(err.detail(), "Unexpected error: ssh timeout");
}

#[tokio::test]
async fn test_tee_operation_reported_failure() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/tee-operation")
        .match_body(mockito::Matcher::Json(json!({"containerName": "nginx", "operation": "encapsulate"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"success": false, "message": "TEE operation failed with exit code 1", "details": "checkpoint failed"}).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let request = TeeOperationRequest { container_name: "nginx".into(), operation: TeeOperation::Encapsulate };
    let err = client.perform_tee_operation(&request).await.unwrap_err();

    mock.assert_async().await;
    match err {
        ApiError::Operation { message, details } => {
            assert_eq!(message, "TEE operation failed with exit code 1");
            assert_eq!(details, "checkpoint failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_operation_history() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/tee-operation/operations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"operations": ["2024-05-01 nginx encapsulate ok"]}).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let history = client.get_operation_history().await.unwrap();
    assert_eq!(history.operations.len(), 1);
    assert!(history.error.is_none());
}

#[tokio::test]
async fn test_migration_status() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/migration-status/web-0")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"status": "running", "log_path": "/logs/web/x", "message": "Migration is still in progress"}).to_string())
        .create_async()
        .await;

    let client = DashboardClient::new(&server.url()).unwrap();
    let status = client.migration_status("web-0").await.unwrap();
    assert_eq!(status.status, "running");
    assert_eq!(status.log_path.as_deref(), Some("/logs/web/x"));
}

#[tokio::test]
async fn test_download_streams_to_file() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/logs/download/web/run-1/migration_log.txt")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body("line one\nline two\n")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.txt");
    let client = DashboardClient::new(&server.url()).unwrap();
    let path = vec!["web".to_string(), "run-1".to_string(), "migration_log.txt".to_string()];
    let written = client.download_file(&path, &dest).await.unwrap();

    assert_eq!(written, 18);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "line one\nline two\n");
}

#[tokio::test]
async fn test_truncated_download_leaves_no_file() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 1000\r\n\r\nonly 13 bytes")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("web_run-1_migration_log.txt");
    let client = DashboardClient::new(&format!("http://{addr}")).unwrap();
    let path = vec!["web".to_string(), "run-1".to_string(), "migration_log.txt".to_string()];
    let result = client.download_file(&path, &dest).await;

    assert!(result.is_err());
    assert!(!dest.exists());
}

#[test]
fn test_rejects_invalid_base_url() {
    assert!(DashboardClient::new("not a url").is_err());
}
