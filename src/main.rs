mod commands;
use clap::{Parser, Subcommand};
use migdash::api::DashboardClient;
use migdash::config::{Settings, DEFAULT_API_URL};
use migdash::models::{AttackType, TeeOperation};
use migdash::utils;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "migdash", about = "Container migration operations console", author, version, long_about = None)]
struct Cli {
    /// Base URL of the migration backend
    #[arg(long, global = true, env = "MIGDASH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Refresh interval of pod tables, in milliseconds
    #[arg(long, global = true, env = "MIGDASH_PODS_INTERVAL_MS", default_value_t = 3000)]
    pods_interval_ms: u64,
    /// Refresh interval of the container table, in milliseconds
    #[arg(long, global = true, env = "MIGDASH_CONTAINERS_INTERVAL_MS", default_value_t = 5000)]
    containers_interval_ms: u64,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, env = "MIGDASH_LOG_FILE")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live side-by-side pod tables of two clusters
    Overview {
        /// Target namespace.
        /// If -n is passed without a value, shows interactive menu.
        /// If -n is missing, uses the default namespace.
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
        #[arg(long, default_value = "cluster1")]
        left: String,
        #[arg(long, default_value = "cluster-sev-snp")]
        right: String,
    },
    /// List pods of one cluster
    Pods {
        #[arg(short, long)]
        cluster: String,
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
    },
    /// Delete a pod (menu if --pod is missing)
    Delete {
        #[arg(short, long)]
        cluster: String,
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
        #[arg(short, long)]
        pod: Option<String>,
    },
    /// Migrate a running pod to another cluster
    Migrate {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
        #[arg(short, long)]
        pod: Option<String>,
        /// Produce a forensic analysis report
        #[arg(long, default_value_t = false)]
        forensic: bool,
        /// Ask for an AI remediation suggestion
        #[arg(long, default_value_t = false)]
        ai_suggestion: bool,
    },
    /// Show the state of the latest migration of a pod
    Status {
        #[arg(short, long)]
        pod: String,
    },
    /// Trigger an attack simulation against a vulnerable app
    Simulate {
        #[arg(long)]
        app: Option<String>,
        /// reverse_shell, data_destruction or log_removal
        #[arg(long)]
        attack: Option<AttackType>,
    },
    /// TEE (SEV-SNP) encapsulation of podman containers
    Tee {
        #[command(subcommand)]
        command: TeeCommands,
    },
    /// Browse migration logs
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand)]
enum TeeCommands {
    /// List containers of both environments
    Containers,
    /// Live container table with encapsulate/decapsulate keys
    Watch,
    /// Encapsulate or decapsulate one container
    Apply {
        #[arg(long)]
        container: Option<String>,
        /// encapsulate or decapsulate
        #[arg(long)]
        operation: Option<TeeOperation>,
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Show past TEE operations
    History,
}

#[derive(Subcommand)]
enum LogCommands {
    /// Print the log directory tree
    Tree,
    /// Print a text log file
    View {
        path: String,
        /// Only show lines matching this regex
        #[arg(short, long)]
        filter: Option<String>,
        /// Hide lines matching this regex
        #[arg(short, long)]
        exclude: Option<String>,
    },
    /// Save a text log file locally
    Download {
        path: String,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

fn is_tui(command: &Commands) -> bool {
    matches!(command, Commands::Overview { .. } | Commands::Tee { command: TeeCommands::Watch })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Full-screen views log nothing to the terminal unless a file is given.
    let default_level = if is_tui(&cli.command) && cli.log_file.is_none() { "off" } else { "warn" };
    utils::init_tracing(cli.log_file.as_deref(), default_level)?;

    let settings = Settings {
        api_url: cli.api_url.clone(),
        pods_interval: Duration::from_millis(cli.pods_interval_ms),
        containers_interval: Duration::from_millis(cli.containers_interval_ms),
        ..Settings::default()
    };

    // One client for the whole process
    let client = Arc::new(DashboardClient::new(&settings.api_url)?);
    tracing::debug!(api = %settings.api_url, "client ready");

    match cli.command {
        Commands::Overview { namespace, left, right } => {
            commands::overview::run(client, settings, namespace, left, right)?;
        }
        Commands::Pods { cluster, namespace } => {
            commands::pods::list(&client, &settings, cluster, namespace).await?;
        }
        Commands::Delete { cluster, namespace, pod } => {
            commands::pods::delete(&client, &settings, cluster, namespace, pod).await?;
        }
        Commands::Migrate { source, target, namespace, pod, forensic, ai_suggestion } => {
            let args = commands::migrate::MigrateArgs { source, target, namespace, pod, forensic, ai_suggestion };
            commands::migrate::run(&client, &settings, args).await?;
        }
        Commands::Status { pod } => {
            commands::migrate::status(&client, &pod).await?;
        }
        Commands::Simulate { app, attack } => {
            commands::simulate::run(&client, &settings, app, attack).await?;
        }
        Commands::Tee { command } => match command {
            TeeCommands::Containers => commands::tee::containers(&client).await?,
            TeeCommands::Watch => commands::tee::watch(client, settings)?,
            TeeCommands::Apply { container, operation, yes } => {
                commands::tee::apply(&client, container, operation, yes).await?
            }
            TeeCommands::History => commands::tee::history(&client).await?,
        },
        Commands::Logs { command } => match command {
            LogCommands::Tree => commands::logs::tree(client).await?,
            LogCommands::View { path, filter, exclude } => commands::logs::view(client, &path, filter, exclude).await?,
            LogCommands::Download { path, out } => commands::logs::download(client, &path, &out).await?,
        },
    }
    Ok(())
}
