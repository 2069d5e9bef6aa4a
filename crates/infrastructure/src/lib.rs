//! SynthDNS Infrastructure Layer
//!
//! Adapters around the application engine: the rule-directive parser,
//! the DNS server handler, the UDP upstream forwarder, the metrics
//! recorder, and the static metadata provider.
pub mod config;
pub mod dns;
pub mod metadata;
pub mod metrics;
