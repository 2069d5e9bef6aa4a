use thiserror::Error;

/// Load-time failures. Any of these aborts startup before the server
/// begins answering queries.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid query class: {0}")]
    InvalidQueryClass(String),

    #[error("Invalid record type: {0}")]
    InvalidRecordType(String),

    #[error("Could not parse regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid forward target: {0}")]
    InvalidForwardTarget(String),

    #[error("Could not compile template '{name}': {reason}")]
    TemplateSyntax { name: String, reason: String },

    #[error("Unknown directive '{0}' at line {1}")]
    UnknownDirective(String, usize),

    #[error("Directive '{0}' requires at least one argument (line {1})")]
    MissingArgument(String, usize),

    #[error("Unexpected token '{0}' at line {1}")]
    UnexpectedToken(String, usize),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Per-query failures. Always converted to a DNS response code at the
/// handler boundary, never propagated past it.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("No pattern matched '{0}' and fallthrough is disabled")]
    RuleTerminalMismatch(String),

    #[error("Template render failed: {0}")]
    TemplateRender(String),

    #[error("Invalid resource record text: {0}")]
    RecordParse(String),

    #[error("Upstream reply does not correspond to the query")]
    UpstreamMismatch,

    #[error("Upstream resolution deadline elapsed for {0}")]
    UpstreamDeadline(String),

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport error from {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("Query cancelled before a response was produced")]
    Cancelled,
}
