//! Single-shot actions: migration, attack simulation, TEE operations and pod
//! deletion. Each form allows one request at a time and never retries; a
//! failed attempt keeps the selections so the user can resubmit.

use crate::api::DashboardClient;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::notify::Notifier;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const SIMULATION_POD_PREFIX: &str = "vuln-spring";

/// Loading flag shared between a form and whoever renders it.
#[derive(Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

pub struct InFlightGuard(Arc<AtomicBool>);

impl InFlight {
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn busy() -> ApiError {
    ApiError::validation("A request is already in progress")
}

/// Pods offered for migration: running ones only.
pub fn running_pod_choices(pods: &[Pod]) -> Vec<PodOption> {
    pods.iter().filter(|p| p.is_running()).map(PodOption::from).collect()
}

/// Apps that can be attacked: running pods of the vulnerable demo app.
pub fn simulation_targets(pods: &[Pod]) -> Vec<String> {
    pods.iter()
        .filter(|p| p.is_running() && p.pod_name.starts_with(SIMULATION_POD_PREFIX))
        .map(|p| p.app_name.clone())
        .collect()
}

// --- MIGRATION ---

#[derive(Default)]
pub struct MigrationForm {
    pub source: Option<String>,
    pub target: Option<String>,
    pub namespace: Option<String>,
    pub pod: Option<PodOption>,
    pub forensic_analysis: bool,
    pub ai_suggestion: bool,
    pub loading: InFlight,
}

impl MigrationForm {
    pub fn is_complete(&self) -> bool {
        [&self.source, &self.target, &self.namespace]
            .iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
            && self.pod.is_some()
    }

    pub fn request(&self) -> ApiResult<MigrationRequest> {
        match (&self.source, &self.target, &self.namespace, &self.pod) {
            (Some(source), Some(target), Some(namespace), Some(pod)) if self.is_complete() => Ok(MigrationRequest {
                source_cluster: source.clone(),
                target_cluster: target.clone(),
                namespace: namespace.clone(),
                pod_name: pod.pod_name.clone(),
                app_name: pod.app_name.clone(),
                forensic_analysis: self.forensic_analysis,
                ai_suggestion: self.ai_suggestion,
            }),
            _ => Err(ApiError::validation("Select source cluster, target cluster, namespace and pod")),
        }
    }

    pub fn reset(&mut self) {
        self.source = None;
        self.target = None;
        self.namespace = None;
        self.pod = None;
        self.forensic_analysis = false;
        self.ai_suggestion = false;
    }

    pub async fn submit(&mut self, client: &DashboardClient, notifier: &Notifier) -> ApiResult<MigrationStarted> {
        let request = match self.request() {
            Ok(r) => r,
            Err(e) => {
                notifier.warn("Validation Error", e.detail());
                return Err(e);
            }
        };
        let _guard = self.loading.try_begin().ok_or_else(busy)?;

        match client.migrate_pod(&request).await {
            Ok(started) => {
                notifier.success("Migration started successfully");
                self.reset();
                Ok(started)
            }
            Err(e) => {
                notifier.error(e.detail());
                Err(e)
            }
        }
    }
}

// --- SIMULATION ---

#[derive(Default)]
pub struct SimulationForm {
    pub app: Option<String>,
    pub attack: Option<AttackType>,
    pub loading: InFlight,
}

impl SimulationForm {
    pub fn reset(&mut self) {
        self.app = None;
        self.attack = None;
    }

    pub async fn submit(&mut self, client: &DashboardClient, notifier: &Notifier) -> ApiResult<()> {
        let (Some(app), Some(attack)) = (self.app.clone(), self.attack) else {
            let e = ApiError::validation("Select a target application and an attack type");
            notifier.warn("Validation Error", e.detail());
            return Err(e);
        };
        let _guard = self.loading.try_begin().ok_or_else(busy)?;

        let request = SimulationRequest { app_name: app.clone(), attack_type: attack };
        match client.trigger_simulation(&request).await {
            Ok(()) => {
                notifier.success(format!("{} triggered successfully on {}", attack.as_str(), app));
                self.reset();
                Ok(())
            }
            Err(e) => {
                notifier.error(format!("Failed to trigger attack on {}: {}", app, e.detail()));
                Err(e)
            }
        }
    }
}

// --- TEE ---

#[derive(Default)]
pub struct TeeForm {
    pub container: Option<String>,
    pub operation: Option<TeeOperation>,
    pub loading: InFlight,
    /// Text block describing the last submitted operation.
    pub last_log: Option<String>,
}

fn placement(containers: &[PodmanContainer], name: &str) -> (bool, bool) {
    let in_normal = containers.iter().any(|c| c.name == name && !c.is_sev_snp());
    let in_sev_snp = containers.iter().any(|c| c.name == name && c.is_sev_snp());
    (in_normal, in_sev_snp)
}

impl TeeForm {
    /// Encapsulation moves a normal container into SEV-SNP, decapsulation the reverse.
    pub fn is_valid(&self, containers: &[PodmanContainer]) -> bool {
        let (Some(name), Some(op)) = (&self.container, self.operation) else {
            return false;
        };
        match (op, placement(containers, name)) {
            (TeeOperation::Encapsulate, (true, false)) => true,
            (TeeOperation::Decapsulate, (false, true)) => true,
            _ => false,
        }
    }

    /// Why the current selection cannot be submitted, if it can't.
    pub fn hint(&self, containers: &[PodmanContainer]) -> Option<String> {
        let Some(name) = &self.container else {
            return Some("Please select an application first".into());
        };
        match (placement(containers, name), self.operation) {
            ((true, false), Some(TeeOperation::Decapsulate)) => {
                Some("Container must be in SEV-SNP environment to decapsulate".into())
            }
            ((false, true), Some(TeeOperation::Encapsulate)) => {
                Some("Container must be in normal environment to encapsulate".into())
            }
            ((true, false), _) | ((false, true), _) => None,
            _ => Some("Container not found in either environment".into()),
        }
    }

    pub fn confirm_prompt(&self) -> Option<String> {
        let (Some(name), Some(op)) = (&self.container, self.operation) else {
            return None;
        };
        Some(format!("Are you sure you want to {} container \"{}\"?", op.as_str(), name))
    }

    pub fn reset(&mut self) {
        self.container = None;
        self.operation = None;
    }

    /// Checks the selection against the latest container snapshot. Sends a
    /// warning and returns the request only when it is valid.
    pub fn validate(&self, containers: &[PodmanContainer], notifier: &Notifier) -> Option<TeeOperationRequest> {
        if !self.is_valid(containers) {
            notifier.warn("Validation Error", "Please select a valid application and operation combination");
            return None;
        }
        Some(TeeOperationRequest { container_name: self.container.clone()?, operation: self.operation? })
    }

    pub async fn submit(
        &mut self,
        containers: &[PodmanContainer],
        client: &DashboardClient,
        notifier: &Notifier,
    ) -> ApiResult<TeeOperationResponse> {
        let Some(request) = self.validate(containers, notifier) else {
            return Err(ApiError::validation("Please select a valid application and operation combination"));
        };
        let _guard = self.loading.try_begin().ok_or_else(busy)?;

        let (result, log) = run_tee_operation(client, notifier, &request).await;
        self.last_log = Some(log);
        if result.is_ok() {
            self.reset();
        }
        result
    }
}

/// Sends one TEE operation and reports it. Returns the outcome together with
/// the operation log block shown to the user.
pub async fn run_tee_operation(
    client: &DashboardClient,
    notifier: &Notifier,
    request: &TeeOperationRequest,
) -> (ApiResult<TeeOperationResponse>, String) {
    let result = client.perform_tee_operation(request).await;
    let log = match &result {
        Ok(resp) => {
            notifier.success(format!("Container {} operation started successfully", request.operation.as_str()));
            operation_log(request, true, resp.details.as_deref().filter(|d| !d.is_empty()).unwrap_or("No additional details"))
        }
        Err(e) => {
            notifier.error(e.detail());
            let details = match e {
                ApiError::Operation { details, .. } if !details.is_empty() => details.clone(),
                other => other.detail(),
            };
            operation_log(request, false, &details)
        }
    };
    (result, log)
}

pub fn operation_log(request: &TeeOperationRequest, success: bool, details: &str) -> String {
    let (status, heading) = if success { ("Success", "Details") } else { ("Failed", "Error Details") };
    format!(
        "TEE Operation Log\n============================\nOperation: {}\nContainer: {}\nStatus: {}\n\n{}:\n{}\n",
        request.operation.as_str(),
        request.container_name,
        status,
        heading,
        details
    )
}

// --- POD DELETION ---

pub async fn delete_pod(
    client: &DashboardClient,
    notifier: &Notifier,
    cluster: &str,
    namespace: &str,
    pod_name: &str,
) -> ApiResult<()> {
    match client.delete_pod(cluster, namespace, pod_name).await {
        Ok(()) => {
            notifier.success(format!("Pod {pod_name} deleted successfully."));
            Ok(())
        }
        Err(e) => {
            notifier.error(format!("Failed to delete pod {}: {}", pod_name, e.detail()));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(name: &str, app: &str, status: &str) -> Pod {
        Pod { pod_name: name.into(), app_name: app.into(), status: status.into(), age: None, reason: None }
    }

    fn container(name: &str, env: &str) -> PodmanContainer {
        PodmanContainer { name: name.into(), id: "abc".into(), image: "img".into(), status: "Up".into(), environment: env.into() }
    }

    #[test]
    fn only_running_pods_are_offered() {
        let pods = vec![pod("a-0", "a", "Running"), pod("b-0", "b", "Pending"), pod("vuln-spring-1", "vuln-spring", "Running")];
        let choices = running_pod_choices(&pods);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].to_string(), "a-0 (a)");
        assert_eq!(simulation_targets(&pods), vec!["vuln-spring"]);
    }

    #[test]
    fn migration_form_requires_all_selections() {
        let mut form = MigrationForm {
            source: Some("cluster1".into()),
            target: Some("cluster2".into()),
            namespace: Some("default".into()),
            ..Default::default()
        };
        assert!(!form.is_complete());
        assert!(form.request().is_err());

        form.pod = Some(PodOption { pod_name: "web-0".into(), app_name: "web".into() });
        form.ai_suggestion = true;
        let req = form.request().unwrap();
        assert_eq!(req.app_name, "web");
        assert!(req.ai_suggestion && !req.forensic_analysis);

        form.namespace = Some(String::new());
        assert!(!form.is_complete());
    }

    #[test]
    fn tee_validity_depends_on_current_environment() {
        let containers = vec![container("nginx", ENV_NORMAL), container("redis", ENV_SEV_SNP)];
        let mut form = TeeForm { container: Some("nginx".into()), operation: Some(TeeOperation::Encapsulate), ..Default::default() };
        assert!(form.is_valid(&containers));
        assert_eq!(form.hint(&containers), None);

        form.operation = Some(TeeOperation::Decapsulate);
        assert!(!form.is_valid(&containers));
        assert_eq!(form.hint(&containers).unwrap(), "Container must be in SEV-SNP environment to decapsulate");

        form.container = Some("redis".into());
        assert!(form.is_valid(&containers));

        form.container = Some("ghost".into());
        assert_eq!(form.hint(&containers).unwrap(), "Container not found in either environment");

        // present in both environments: neither direction applies
        let both = vec![container("db", ENV_NORMAL), container("db", ENV_SEV_SNP)];
        form.container = Some("db".into());
        assert!(!form.is_valid(&both));
    }

    #[test]
    fn invalid_tee_selection_warns_without_request() {
        let (notifier, mut feed) = Notifier::channel();
        let form = TeeForm { container: Some("nginx".into()), operation: Some(TeeOperation::Decapsulate), ..Default::default() };
        assert!(form.validate(&[container("nginx", ENV_NORMAL)], &notifier).is_none());
        let notes = feed.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].summary, "Validation Error");
    }

    #[test]
    fn operation_log_reports_failure_details() {
        let req = TeeOperationRequest { container_name: "nginx".into(), operation: TeeOperation::Encapsulate };
        let log = operation_log(&req, false, "ssh: connection refused");
        assert!(log.starts_with("TEE Operation Log\n"));
        assert!(log.contains("Status: Failed"));
        assert!(log.contains("Error Details:\nssh: connection refused"));
    }

    #[test]
    fn in_flight_flag_blocks_second_submission() {
        let flag = InFlight::default();
        let guard = flag.try_begin().unwrap();
        assert!(flag.is_active());
        assert!(flag.try_begin().is_none());
        drop(guard);
        assert!(!flag.is_active());
    }
}
