use crate::error::{ApiError, ApiResult};
use crate::models::*;
use futures::StreamExt;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// HTTP client for the migration backend. Built once in `main` and shared
/// (behind an `Arc`) by every view and command.
#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::validation(format!("invalid API url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::validation(format!("invalid API url '{base_url}'")));
        }
        Ok(Self { http: Client::new(), base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for s in segments {
                path.push(s.as_ref());
            }
        }
        url
    }

    // --- PODS ---

    pub async fn get_pods(&self, cluster: &str, namespace: &str) -> ApiResult<Vec<Pod>> {
        let url = self.url(["k8s", "pods", cluster, namespace]);
        tracing::debug!(%url, "fetching pods");
        let resp: PodsResponse = decode(self.http.get(url).send().await?).await?;
        Ok(resp.pods)
    }

    pub async fn delete_pod(&self, cluster: &str, namespace: &str, pod_name: &str) -> ApiResult<()> {
        let url = self.url(["k8s", "pods", cluster, namespace, pod_name]);
        tracing::info!(cluster, namespace, pod_name, "deleting pod");
        check(self.http.delete(url).send().await?).await?;
        Ok(())
    }

    // --- MIGRATION ---

    pub async fn migrate_pod(&self, request: &MigrationRequest) -> ApiResult<MigrationStarted> {
        let url = self.url(["migrate"]);
        tracing::info!(pod = %request.pod_name, from = %request.source_cluster, to = %request.target_cluster, "requesting migration");
        decode(self.http.post(url).json(request).send().await?).await
    }

    pub async fn migration_status(&self, pod_name: &str) -> ApiResult<MigrationStatus> {
        let url = self.url(["migration-status", pod_name]);
        decode(self.http.get(url).send().await?).await
    }

    // --- SIMULATION ---

    pub async fn trigger_simulation(&self, request: &SimulationRequest) -> ApiResult<()> {
        let url = self.url(["simulate"]);
        tracing::info!(app = %request.app_name, attack = request.attack_type.as_str(), "triggering attack simulation");
        check(self.http.post(url).json(request).send().await?).await?;
        Ok(())
    }

    // --- TEE ---

    /// Containers of both environments, normal first. A backend-side `error`
    /// field counts as a failed fetch.
    pub async fn get_podman_containers(&self) -> ApiResult<Vec<PodmanContainer>> {
        let url = self.url(["tee-operation", "containers"]);
        let resp: PodmanContainersResponse = decode(self.http.get(url).send().await?).await?;
        if let Some(detail) = resp.error {
            return Err(ApiError::Server { status: 200, detail });
        }
        let mut all = resp.normal_containers;
        all.extend(resp.sevsnp_containers);
        Ok(all)
    }

    pub async fn perform_tee_operation(&self, request: &TeeOperationRequest) -> ApiResult<TeeOperationResponse> {
        let url = self.url(["tee-operation"]);
        tracing::info!(container = %request.container_name, operation = request.operation.as_str(), "sending TEE operation");
        let resp: TeeOperationResponse = decode(self.http.post(url).json(request).send().await?).await?;
        if !resp.success {
            return Err(ApiError::Operation {
                message: resp.message,
                details: resp.details.unwrap_or_default(),
            });
        }
        Ok(resp)
    }

    pub async fn get_operation_history(&self) -> ApiResult<OperationHistory> {
        let url = self.url(["tee-operation", "operations"]);
        decode(self.http.get(url).send().await?).await
    }

    // --- LOGS ---

    pub async fn get_log_structure(&self) -> ApiResult<Vec<LogNodeWire>> {
        let url = self.url(["logs", "structure"]);
        let resp: LogStructureResponse = decode(self.http.get(url).send().await?).await?;
        Ok(resp.data)
    }

    pub async fn view_file(&self, path: &[String]) -> ApiResult<String> {
        let url = self.url(["logs", "view"].into_iter().map(String::from).chain(path.iter().cloned()));
        let resp: FileContentResponse = decode(self.http.get(url).send().await?).await?;
        Ok(resp.content)
    }

    /// Streams the file body into `dest`, returning the number of bytes written.
    /// A body that fails partway leaves no file behind.
    pub async fn download_file(&self, path: &[String], dest: &Path) -> ApiResult<u64> {
        let url = self.url(["logs", "download"].into_iter().map(String::from).chain(path.iter().cloned()));
        let resp = check(self.http.get(url).send().await?).await?;

        match write_body(resp, dest).await {
            Ok(written) => {
                tracing::info!(dest = %dest.display(), bytes = written, "downloaded log file");
                Ok(written)
            }
            Err(e) => {
                tracing::warn!(dest = %dest.display(), error = %e, "download failed, removing partial file");
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    tracing::debug!(dest = %dest.display(), error = %rm, "could not remove partial file");
                }
                Err(e)
            }
        }
    }
}

async fn write_body(resp: Response, dest: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Turns a non-2xx response into `ApiError::Server`, preferring the
/// FastAPI `detail` field over the raw body.
async fn check(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| if body.trim().is_empty() { status.to_string() } else { body });
    tracing::debug!(status = status.as_u16(), %detail, "backend returned error");
    Err(ApiError::Server { status: status.as_u16(), detail })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let bytes = check(resp).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
