use migdash::api::DashboardClient;
use migdash::app::App;
use migdash::config::Settings;
use migdash::{tui, utils};
use std::sync::Arc;

pub fn run(
    client: Arc<DashboardClient>,
    settings: Settings,
    namespace_arg: Option<Option<String>>,
    left: String,
    right: String,
) -> anyhow::Result<()> {
    let namespace = utils::get_selected_namespace(&settings, namespace_arg)?;
    let app = App::overview(client, settings, namespace, left, right);
    // the draw loop blocks; the poll tasks keep running on the other workers
    tokio::task::block_in_place(|| tui::run(app))
}
