use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const CLUSTERS: [&str; 3] = ["cluster1", "cluster2", "cluster-sev-snp"];
pub const NAMESPACES: [&str; 2] = ["default", "istio-enabled"];

/// Runtime settings assembled from command-line flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub pods_interval: Duration,
    pub containers_interval: Duration,
    pub clusters: Vec<String>,
    pub namespaces: Vec<String>,
    /// Cluster whose pods can be migrated or attacked.
    pub source_cluster: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            pods_interval: Duration::from_millis(3000),
            containers_interval: Duration::from_millis(5000),
            clusters: CLUSTERS.iter().map(|s| s.to_string()).collect(),
            namespaces: NAMESPACES.iter().map(|s| s.to_string()).collect(),
            source_cluster: CLUSTERS[0].to_string(),
        }
    }
}

impl Settings {
    pub fn default_namespace(&self) -> &str {
        self.namespaces.first().map(String::as_str).unwrap_or("default")
    }

    /// Clusters a pod in `source` can be migrated to.
    pub fn target_clusters(&self, source: &str) -> Vec<String> {
        self.clusters.iter().filter(|c| *c != source).cloned().collect()
    }

    /// Cluster shown after `current` when cycling through the list.
    pub fn next_cluster(&self, current: &str) -> String {
        cycle(&self.clusters, current)
    }

    pub fn next_namespace(&self, current: &str) -> String {
        cycle(&self.namespaces, current)
    }
}

fn cycle(list: &[String], current: &str) -> String {
    let pos = list.iter().position(|c| c == current);
    let next = pos.map(|p| (p + 1) % list.len()).unwrap_or(0);
    list.get(next).cloned().unwrap_or_else(|| current.to_string())
}
