use synthdns_application::services::RuleSet;
use synthdns_domain::{Config, ConfigError};
use synthdns_infrastructure::config::parse_rules;
use tracing::warn;

pub fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Reads and compiles the rule directive file. Every regex and
/// template compiles here, before the server starts answering.
pub fn load_rule_set(path: &str) -> anyhow::Result<RuleSet> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
    let configs = parse_rules(&text)?;
    if configs.is_empty() {
        warn!(rules_file = %path, "Rule file contains no rules; every query will be refused");
    }
    Ok(RuleSet::compile(configs)?)
}
