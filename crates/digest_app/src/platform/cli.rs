use std::path::PathBuf;

use clap::Parser;
use digest_core::Country;

use super::logging::LogDestination;

/// Command-line arguments for digest_app
#[derive(Parser, Debug)]
#[command(name = "digest_app")]
#[command(about = "Submit news markdown files for digest generation and follow the run")]
#[command(version)]
pub struct Cli {
    /// Markdown files to submit
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Digest server base url (overrides the config file)
    #[arg(short, long, env = "DIGEST_SERVER")]
    pub server: Option<String>,

    /// Country the digest is generated for
    #[arg(short, long, default_value = "Sweden")]
    pub country: Country,

    /// Directory for the downloaded digest (overrides the config file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// RON config file
    #[arg(long, default_value = "digest_client.ron")]
    pub config: PathBuf,

    /// Do not fetch the digest when the run completes
    #[arg(long)]
    pub no_download: bool,

    /// Where log records go (overrides the config file)
    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,
}
