use super::print_notifications;
use migdash::api::DashboardClient;
use migdash::config::Settings;
use migdash::forms;
use migdash::models::PodOption;
use migdash::notify::Notifier;
use migdash::utils;
use colored::*;
use inquire::{Confirm, Select};

pub async fn list(
    client: &DashboardClient,
    settings: &Settings,
    cluster: String,
    namespace_arg: Option<Option<String>>,
) -> anyhow::Result<()> {
    let namespace = utils::get_selected_namespace(settings, namespace_arg)?;

    let pb = utils::create_spinner(&format!("Fetching pods of {cluster}..."));
    let pods = client.get_pods(&cluster, &namespace).await;
    pb.finish_and_clear();
    let pods = pods?;

    println!("\n{}", format!("--- PODS {cluster}/{namespace} ---").bold().bright_white());
    if pods.is_empty() {
        println!("   (No pods)");
    } else {
        println!("{}", utils::pods_table(&pods));
    }
    Ok(())
}

pub async fn delete(
    client: &DashboardClient,
    settings: &Settings,
    cluster: String,
    namespace_arg: Option<Option<String>>,
    pod_arg: Option<String>,
) -> anyhow::Result<()> {
    let namespace = utils::get_selected_namespace(settings, namespace_arg)?;

    let pod_name = match pod_arg {
        Some(name) => name,
        None => {
            let pb = utils::create_spinner("Fetching pods...");
            let pods = client.get_pods(&cluster, &namespace).await;
            pb.finish_and_clear();
            let options: Vec<PodOption> = pods?.iter().map(PodOption::from).collect();
            if options.is_empty() {
                anyhow::bail!("no pods in {cluster}/{namespace}");
            }
            let picked = Select::new("Select pod to delete:", options).prompt()?;
            if !Confirm::new(&format!("Delete {}?", picked.pod_name)).with_default(false).prompt()? {
                return Ok(());
            }
            picked.pod_name
        }
    };

    let (notifier, mut feed) = Notifier::channel();
    let result = forms::delete_pod(client, &notifier, &cluster, &namespace, &pod_name).await;
    print_notifications(&mut feed);
    if result.is_err() {
        anyhow::bail!("pod {pod_name} was not deleted");
    }
    Ok(())
}
