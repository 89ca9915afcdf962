use serde::{Deserialize, Serialize};
use std::fmt;

// --- PODS ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub pod_name: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub age: Option<String>,
    /// Waiting reason, only reported for pending pods.
    #[serde(default)]
    pub reason: Option<String>,
}

impl Pod {
    pub fn is_running(&self) -> bool {
        self.status == "Running"
    }
}

#[derive(Debug, Deserialize)]
pub struct PodsResponse {
    pub pods: Vec<Pod>,
}

/// A pod as offered in a selection menu.
#[derive(Debug, Clone, PartialEq)]
pub struct PodOption {
    pub pod_name: String,
    pub app_name: String,
}

impl From<&Pod> for PodOption {
    fn from(p: &Pod) -> Self {
        PodOption { pod_name: p.pod_name.clone(), app_name: p.app_name.clone() }
    }
}

impl fmt::Display for PodOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.pod_name, self.app_name)
    }
}

// --- MIGRATION ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    pub source_cluster: String,
    pub target_cluster: String,
    pub namespace: String,
    pub pod_name: String,
    pub app_name: String,
    pub forensic_analysis: bool,
    #[serde(rename = "AISuggestion")]
    pub ai_suggestion: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationStarted {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub log_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationStatus {
    pub status: String,
    #[serde(default)]
    pub log_path: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// --- ATTACK SIMULATION ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    ReverseShell,
    DataDestruction,
    LogRemoval,
}

impl AttackType {
    pub const ALL: [AttackType; 3] = [AttackType::ReverseShell, AttackType::DataDestruction, AttackType::LogRemoval];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::ReverseShell => "reverse_shell",
            AttackType::DataDestruction => "data_destruction",
            AttackType::LogRemoval => "log_removal",
        }
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttackType::ReverseShell => "Reverse shell",
            AttackType::DataDestruction => "Data destruction",
            AttackType::LogRemoval => "Log file removal",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for AttackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttackType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown attack '{s}' (expected reverse_shell, data_destruction or log_removal)"))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub app_name: String,
    pub attack_type: AttackType,
}

// --- TEE ENCAPSULATION ---

pub const ENV_NORMAL: &str = "Normal";
pub const ENV_SEV_SNP: &str = "SEV-SNP";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PodmanContainer {
    #[serde(rename = "containerName")]
    pub name: String,
    #[serde(rename = "containerID")]
    pub id: String,
    pub image: String,
    pub status: String,
    pub environment: String,
}

impl PodmanContainer {
    pub fn is_sev_snp(&self) -> bool {
        self.environment == ENV_SEV_SNP
    }
}

#[derive(Debug, Deserialize)]
pub struct PodmanContainersResponse {
    #[serde(default)]
    pub normal_containers: Vec<PodmanContainer>,
    #[serde(default)]
    pub sevsnp_containers: Vec<PodmanContainer>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeeOperation {
    Encapsulate,
    Decapsulate,
}

impl TeeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeeOperation::Encapsulate => "encapsulate",
            TeeOperation::Decapsulate => "decapsulate",
        }
    }
}

impl fmt::Display for TeeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeeOperation::Encapsulate => write!(f, "Encapsulate (Normal → SEV-SNP)"),
            TeeOperation::Decapsulate => write!(f, "Decapsulate (SEV-SNP → Normal)"),
        }
    }
}

impl std::str::FromStr for TeeOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encapsulate" => Ok(TeeOperation::Encapsulate),
            "decapsulate" => Ok(TeeOperation::Decapsulate),
            other => Err(format!("unknown operation '{other}' (expected encapsulate or decapsulate)")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeeOperationRequest {
    #[serde(rename = "containerName")]
    pub container_name: String,
    pub operation: TeeOperation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeeOperationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationHistory {
    #[serde(default)]
    pub operations: Vec<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

// --- LOGS ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogNodeWire {
    pub label: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<LogNodeWire>>,
}

#[derive(Debug, Deserialize)]
pub struct LogStructureResponse {
    pub data: Vec<LogNodeWire>,
}

#[derive(Debug, Deserialize)]
pub struct FileContentResponse {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn migration_request_uses_backend_field_names() {
        let req = MigrationRequest {
            source_cluster: "cluster1".into(),
            target_cluster: "cluster2".into(),
            namespace: "default".into(),
            pod_name: "web-0".into(),
            app_name: "web".into(),
            forensic_analysis: true,
            ai_suggestion: false,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["sourceCluster"], "cluster1");
        assert_eq!(v["podName"], "web-0");
        assert_eq!(v["forensicAnalysis"], true);
        assert_eq!(v["AISuggestion"], false);
    }

    #[test]
    fn pod_tolerates_missing_optional_fields() {
        let p: Pod = serde_json::from_value(json!({"podName": "a", "appName": "N/A", "status": "Pending", "reason": "ImagePullBackOff"})).unwrap();
        assert_eq!(p.reason.as_deref(), Some("ImagePullBackOff"));
        assert!(p.age.is_none());
        assert!(!p.is_running());
    }

    #[test]
    fn operations_parse_from_wire_names() {
        assert_eq!("decapsulate".parse::<TeeOperation>().unwrap(), TeeOperation::Decapsulate);
        assert_eq!("log_removal".parse::<AttackType>().unwrap(), AttackType::LogRemoval);
        assert!("explode".parse::<AttackType>().is_err());
        let body = serde_json::to_value(TeeOperationRequest { container_name: "nginx".into(), operation: TeeOperation::Encapsulate }).unwrap();
        assert_eq!(body, json!({"containerName": "nginx", "operation": "encapsulate"}));
    }
}
