use anyhow::Result;
use clap::Parser;

use farmadex::app::{self, AppCfg};
use farmadex::config::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Multi-source drug price discovery and competitive analysis")]
struct Args {
    /// Drug name, active ingredient or barcode to analyze
    #[arg(long)]
    term: Option<String>,

    /// Two-letter region code (default from config, usually SP)
    #[arg(long)]
    region: Option<String>,

    /// Pharmacy identifier owning the local catalog
    #[arg(long)]
    pharmacy_id: Option<String>,

    /// Only aggregate external prices, skip the local catalog analysis
    #[arg(long)]
    search_only: bool,

    /// Force synthetic data, never touch the network
    #[arg(long)]
    synthetic: bool,

    /// Clear the price cache and exit
    #[arg(long)]
    clear_cache: bool,

    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    let app_cfg = AppCfg::from_cli(
        args.term,
        args.region,
        args.pharmacy_id,
        args.search_only,
        args.clear_cache,
        args.synthetic,
        config,
    );

    app::run(app_cfg).await
}
