//! Drinks API server.

use std::path::PathBuf;

use clap::Parser;

mod config;
mod cors;
mod logging;
mod server;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "drinks-server", version, about = "Drinks API with bearer-token permission gating")]
struct Cli {
    /// YAML configuration file; `DRINKS__*` variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    logging::init(&cfg.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_addr = %cfg.server.bind_addr,
        "drinks-server starting"
    );
    server::run(cfg).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from(["drinks-server", "-c", "config/drinks.yaml", "--print-config"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("config/drinks.yaml")));
        assert!(cli.print_config);
    }
}
