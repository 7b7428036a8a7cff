use std::process;

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use dataproc_manager::cli::{
    build_manager, config_path, config_set, format_cluster_detail, format_cluster_pages,
    format_operation, load_effective_config, with_timeout, Cli, Commands, ConfigAction,
};
use dataproc_manager::cluster::PollConfig;
use dataproc_manager::config::serialize_config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Ctrl-C aborts any wait in progress; the submitted request is not undone
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning wait");
            trigger.cancel();
        }
    });

    let config = load_effective_config(&cli)?;

    match &cli.command {
        Commands::List => {
            let manager = build_manager(&config, cancel)?;
            let pages = manager.list_clusters().await.with_context(|| {
                format!(
                    "listing clusters in {}/{}",
                    manager.project(),
                    manager.region()
                )
            })?;
            print!("{}", format_cluster_pages(&pages, Utc::now()));
        }
        Commands::Get { name } => {
            let manager = build_manager(&config, cancel)?;
            let cluster = manager.get_cluster(name).await?;
            print!("{}", format_cluster_detail(&cluster));
        }
        Commands::Create(args) => {
            let mut config = with_timeout(config, args.timeout);
            if args.no_validate {
                config.validate_requests = false;
            }
            let manager = build_manager(&config, cancel)?;
            let operation = manager
                .create_cluster(&args.name, args.worker_count(), &args.worker_names)
                .await?;
            print!("{}", format_operation("created", &args.name, &operation));
        }
        Commands::Delete(args) => {
            let mut config = with_timeout(config, args.timeout);
            if let Some(until) = args.until {
                config.delete_wait = until;
            }
            let manager = build_manager(&config, cancel)?;
            let operation = manager.delete_cluster(&args.name).await?;
            print!("{}", format_operation("deleted", &args.name, &operation));
        }
        Commands::Wait(args) => {
            let config = with_timeout(config, args.timeout);
            let manager = build_manager(&config, cancel)?;
            let mut poll: PollConfig = manager.config().poll.clone();
            if let Some(secs) = args.interval {
                poll = poll.with_interval(std::time::Duration::from_secs(secs));
            }
            manager
                .wait_for_state_with(&args.name, args.state, &poll)
                .await?;
            println!("Cluster {} is {}", args.name, args.state);
        }
        Commands::Config(args) => match &args.action {
            ConfigAction::View => print!("{}", serialize_config(&config)?),
            ConfigAction::Path => println!("{}", config_path(&cli).display()),
            ConfigAction::Set { key, value } => {
                let path = config_path(&cli);
                config_set(&path, key, value)?;
                println!("Set {} in {}", key, path.display());
            }
        },
    }

    Ok(())
}
