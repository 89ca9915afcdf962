use super::print_notifications;
use migdash::api::DashboardClient;
use migdash::app::App;
use migdash::config::Settings;
use migdash::forms::TeeForm;
use migdash::models::TeeOperation;
use migdash::notify::Notifier;
use migdash::{tui, utils};
use colored::*;
use inquire::{Confirm, Select};
use std::sync::Arc;

pub async fn containers(client: &DashboardClient) -> anyhow::Result<()> {
    let pb = utils::create_spinner("Fetching podman containers...");
    let containers = client.get_podman_containers().await;
    pb.finish_and_clear();
    let containers = containers?;

    println!("\n{}", "--- PODMAN CONTAINERS ---".bold().bright_white());
    if containers.is_empty() {
        println!("   (No podman containers found in either environment)");
    } else {
        println!("{}", utils::containers_table(&containers));
    }
    Ok(())
}

pub fn watch(client: Arc<DashboardClient>, settings: Settings) -> anyhow::Result<()> {
    let app = App::tee(client, settings);
    tokio::task::block_in_place(|| tui::run(app))
}

pub async fn apply(
    client: &DashboardClient,
    container_arg: Option<String>,
    operation_arg: Option<TeeOperation>,
    yes: bool,
) -> anyhow::Result<()> {
    let pb = utils::create_spinner("Fetching podman containers...");
    let containers = client.get_podman_containers().await;
    pb.finish_and_clear();
    let containers = containers?;

    let mut form = TeeForm::default();
    form.container = Some(match container_arg {
        Some(c) => c,
        None => {
            let names: Vec<String> = containers.iter().map(|c| format!("{} [{}]", c.name, c.environment)).collect();
            if names.is_empty() {
                anyhow::bail!("no podman containers found in either environment");
            }
            let picked = Select::new("Select container:", names).raw_prompt()?;
            containers[picked.index].name.clone()
        }
    });
    form.operation = Some(match operation_arg {
        Some(op) => op,
        None => Select::new("Select operation:", vec![TeeOperation::Encapsulate, TeeOperation::Decapsulate]).prompt()?,
    });

    if let Some(hint) = form.hint(&containers).filter(|_| !form.is_valid(&containers)) {
        println!("{}", hint.yellow());
    }
    if form.is_valid(&containers) && !yes {
        let question = form.confirm_prompt().unwrap_or_default();
        if !Confirm::new(&question).with_default(false).prompt()? {
            return Ok(());
        }
    }

    let (notifier, mut feed) = Notifier::channel();
    let pb = utils::create_spinner("Running TEE operation...");
    let result = form.submit(&containers, client, &notifier).await;
    pb.finish_and_clear();
    print_notifications(&mut feed);
    if let Some(log) = &form.last_log {
        println!("\n{log}");
    }
    if result.is_err() {
        anyhow::bail!("TEE operation did not complete");
    }
    Ok(())
}

pub async fn history(client: &DashboardClient) -> anyhow::Result<()> {
    let pb = utils::create_spinner("Fetching TEE operation history...");
    let history = client.get_operation_history().await;
    pb.finish_and_clear();
    let history = history?;

    if let Some(err) = &history.error {
        println!("{}", err.red());
    }
    if history.operations.is_empty() {
        println!("   (No TEE operations recorded)");
    }
    for op in &history.operations {
        match op {
            serde_json::Value::String(line) => println!("{line}"),
            other => println!("{other}"),
        }
    }
    Ok(())
}
