use clap::Parser;
use std::sync::Arc;
use synthdns_domain::CliOverrides;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "synthdns")]
#[command(version)]
#[command(about = "SynthDNS - rule-driven DNS response synthesizer")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Rule directive file path
    #[arg(short = 'r', long, value_name = "FILE")]
    rules: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        rules_file: cli.rules.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = synthdns_domain::Config::load(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting SynthDNS v{}", env!("CARGO_PKG_VERSION"));

    let rules = bootstrap::load_rule_set(&config.server.rules_file)?;
    info!(
        rules = rules.len(),
        rules_file = %config.server.rules_file,
        "Rule set loaded"
    );

    let services = di::Services::new(&config, Arc::new(rules));

    server::start_dns_server(
        &config.server.bind_address,
        config.server.dns_port,
        services.handler,
    )
    .await
}
