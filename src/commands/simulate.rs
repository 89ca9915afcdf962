use super::print_notifications;
use migdash::api::DashboardClient;
use migdash::config::Settings;
use migdash::forms::{self, SimulationForm};
use migdash::models::AttackType;
use migdash::notify::Notifier;
use migdash::utils;
use inquire::Select;

pub async fn run(
    client: &DashboardClient,
    settings: &Settings,
    app_arg: Option<String>,
    attack_arg: Option<AttackType>,
) -> anyhow::Result<()> {
    let mut form = SimulationForm::default();

    form.app = Some(match app_arg {
        Some(app) => app,
        None => {
            let pb = utils::create_spinner("Fetching vulnerable apps...");
            let targets = match client.get_pods(&settings.source_cluster, settings.default_namespace()).await {
                Ok(pods) => forms::simulation_targets(&pods),
                Err(e) => {
                    tracing::warn!(error = %e, "could not list simulation targets");
                    Vec::new()
                }
            };
            pb.finish_and_clear();
            if targets.is_empty() {
                anyhow::bail!("no running {} pods in {}", forms::SIMULATION_POD_PREFIX, settings.source_cluster);
            }
            Select::new("Select target app:", targets).prompt()?
        }
    });
    form.attack = Some(match attack_arg {
        Some(a) => a,
        None => Select::new("Select attack:", AttackType::ALL.to_vec()).prompt()?,
    });

    let (notifier, mut feed) = Notifier::channel();
    let result = form.submit(client, &notifier).await;
    print_notifications(&mut feed);
    if result.is_err() {
        anyhow::bail!("simulation was not triggered");
    }
    Ok(())
}
