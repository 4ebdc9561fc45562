use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use wing_commander::{
    MonitorSupervisor,
    actors::messages::{MSG_MONITOR_START, MSG_MONITOR_STOP},
    config::read_config_file,
    notify::build_messenger,
    source::ManagerClient,
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new()
        .with_target("wing_commander", level)
        .with_target("wing_hub", level)
        .with_default(LevelFilter::WARN);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(log_level(args.verbose));
    dotenv::dotenv().ok();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?.with_env_overrides();
    let settings = config.monitor_settings()?;

    let source = ManagerClient::new(&config.manager)?;
    debug!("polling {} every {:?}", source.url(), settings.poll_interval());

    let messenger = build_messenger(config.notify.as_ref());
    let supervisor = MonitorSupervisor::new(settings, Arc::new(source), messenger.clone());

    supervisor.start()?;
    if let Err(e) = messenger.send(MSG_MONITOR_START).await {
        error!("failed to announce start: {e:#}");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    supervisor.stop().await?;
    if let Err(e) = messenger.send(MSG_MONITOR_STOP).await {
        error!("failed to announce stop: {e:#}");
    }

    Ok(())
}
