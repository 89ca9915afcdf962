use super::print_notifications;
use migdash::api::DashboardClient;
use migdash::config::Settings;
use migdash::forms::{self, MigrationForm};
use migdash::notify::Notifier;
use migdash::utils;
use colored::*;
use comfy_table::Table;
use inquire::Select;

pub struct MigrateArgs {
    pub source: Option<String>,
    pub target: Option<String>,
    pub namespace: Option<Option<String>>,
    pub pod: Option<String>,
    pub forensic: bool,
    pub ai_suggestion: bool,
}

pub async fn run(client: &DashboardClient, settings: &Settings, args: MigrateArgs) -> anyhow::Result<()> {
    let mut form = MigrationForm::default();

    let source = utils::pick_or_prompt(args.source, "Select source cluster:", vec![settings.source_cluster.clone()])?;
    form.target = Some(utils::pick_or_prompt(args.target, "Select target cluster:", settings.target_clusters(&source))?);
    let namespace = utils::get_selected_namespace(settings, args.namespace)?;

    // a failed fetch leaves the menu empty instead of aborting
    let pb = utils::create_spinner("Fetching running pods...");
    let choices = match client.get_pods(&source, &namespace).await {
        Ok(pods) => forms::running_pod_choices(&pods),
        Err(e) => {
            tracing::warn!(error = %e, "could not list pods for migration");
            Vec::new()
        }
    };
    pb.finish_and_clear();

    form.pod = Some(match args.pod {
        Some(name) => match choices.into_iter().find(|p| p.pod_name == name) {
            Some(p) => p,
            None => anyhow::bail!("pod {name} is not running in {source}/{namespace}"),
        },
        None => {
            if choices.is_empty() {
                anyhow::bail!("no running pods in {source}/{namespace}");
            }
            Select::new("Select pod to migrate:", choices).prompt()?
        }
    });
    form.source = Some(source);
    form.namespace = Some(namespace);
    form.forensic_analysis = args.forensic;
    form.ai_suggestion = args.ai_suggestion;

    let (notifier, mut feed) = Notifier::channel();
    let pb = utils::create_spinner("Starting migration...");
    let result = form.submit(client, &notifier).await;
    pb.finish_and_clear();
    print_notifications(&mut feed);

    match result {
        Ok(started) => {
            if let Some(path) = started.log_path {
                println!("Logs: {}", path.cyan());
            }
            Ok(())
        }
        Err(_) => anyhow::bail!("migration was not started"),
    }
}

pub async fn status(client: &DashboardClient, pod: &str) -> anyhow::Result<()> {
    let pb = utils::create_spinner("Checking migration status...");
    let status = client.migration_status(pod).await;
    pb.finish_and_clear();
    let status = status?;

    println!("\n{}", format!("--- MIGRATION OF {pod} ---").bold().bright_white());
    let mut table = Table::new();
    table.set_header(vec!["Property", "Value"]);
    let colored = match status.status.as_str() {
        "completed" => status.status.green(),
        "running" => status.status.yellow(),
        "not_found" => status.status.normal(),
        _ => status.status.red(),
    };
    table.add_row(vec!["Status".to_string(), colored.to_string()]);
    if let Some(path) = &status.log_path {
        table.add_row(vec!["Log path".to_string(), path.clone()]);
    }
    if let Some(msg) = &status.message {
        table.add_row(vec!["Message".to_string(), msg.clone()]);
    }
    println!("{table}");

    if let Some(text) = status.result.as_ref().or(status.error.as_ref()) {
        println!("\n{text}");
    }
    Ok(())
}
