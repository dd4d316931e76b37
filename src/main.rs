use std::fs::File;

use anyhow::{Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{LevelFilter, info};
use syslog::{BasicLogger, Facility, Formatter3164};

use shroud_ledd::{application::Application, cli::Cli, config::SettingsStore};

const DAEMON_LOG: &str = "/var/tmp/shroud_ledd.log";

fn init_log(level: LevelFilter) -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: "shroud_ledd".into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}

fn into_daemon() -> Result<()> {
    File::create(DAEMON_LOG)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Fork before the runtime spawns its worker threads.
    if cli.daemonize {
        into_daemon()?;
    }

    if let Err(e) = init_log(cli.log_level) {
        eprintln!("syslog unavailable, continuing without logging: {e}");
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    #[cfg(feature = "tokio-console")]
    console_subscriber::init();

    info!("shroud_ledd {} starting", env!("CARGO_PKG_VERSION"));

    let settings = SettingsStore::load_or_init(cli.settings).await?;

    let mut builder = Application::builder().with_settings_store(settings);
    if let Some(dir) = cli.library_dir {
        builder = builder.with_library_dir(dir);
    }

    builder.build()?.run().await
}
