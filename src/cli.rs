use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the synthetic demo data source instead of the live API
    #[arg(long)]
    pub demo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}
