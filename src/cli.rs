use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// shroud_ledd: daemon for MSI graphics card shroud lighting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings JSON path (default: Settings.json next to the executable)
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,

    /// Directory containing the vendor libraries (default: Lib next to the executable)
    #[arg(short = 'l', long = "library-dir")]
    pub library_dir: Option<PathBuf>,

    /// Detach from the terminal and run in the background
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,

    /// Maximum log level sent to syslog
    #[arg(long = "log-level", default_value = "info", value_parser = parse_level)]
    pub log_level: LevelFilter,
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level '{value}'"))
}
