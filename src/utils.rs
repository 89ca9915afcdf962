use crate::config::Settings;
use crate::models::{Pod, PodmanContainer};
use colored::*;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Select;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// --- SHARED SPINNER ---
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

// --- LOGGING ---

/// `RUST_LOG` wins; otherwise `default_level`. With a log file everything
/// goes there, else to stderr.
pub fn init_tracing(log_file: Option<&Path>, default_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

// --- SHARED NAMESPACE / CLUSTER LOGIC ---

/// `None` uses the configured default, `Some(None)` asks, `Some(Some(ns))` is taken as is.
pub fn get_selected_namespace(settings: &Settings, arg: Option<Option<String>>) -> anyhow::Result<String> {
    match arg {
        None => {
            let ns = settings.default_namespace().to_string();
            println!("Using namespace: {}", ns.cyan());
            Ok(ns)
        }
        Some(None) => Ok(Select::new("Select Namespace:", settings.namespaces.clone()).prompt()?),
        Some(Some(ns)) => Ok(ns),
    }
}

pub fn pick_or_prompt(value: Option<String>, prompt: &str, options: Vec<String>) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Select::new(prompt, options).prompt()?),
    }
}

// --- TABLES ---

pub fn colored_status(status: &str) -> ColoredString {
    match status {
        "Running" => status.green(),
        "Pending" | "ContainerCreating" => status.yellow(),
        s if s.starts_with("Up") => s.green(),
        s => s.red(),
    }
}

pub fn pods_table(pods: &[Pod]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Pod", "App", "Status", "Age"]);
    for p in pods {
        let status = match &p.reason {
            Some(reason) => format!("{} ({})", colored_status(&p.status), reason),
            None => colored_status(&p.status).to_string(),
        };
        table.add_row(vec![
            p.pod_name.clone(),
            p.app_name.clone(),
            status,
            p.age.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn containers_table(containers: &[PodmanContainer]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Container", "ID", "Image", "Status", "Environment"]);
    for c in containers {
        let env = if c.is_sev_snp() { c.environment.magenta() } else { c.environment.normal() };
        table.add_row(vec![
            c.name.clone(),
            c.id.chars().take(12).collect(),
            c.image.clone(),
            colored_status(&c.status).to_string(),
            env.to_string(),
        ]);
    }
    table
}
