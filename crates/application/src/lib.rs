//! SynthDNS Application Layer
//!
//! The rule evaluation engine: compiled rule sets, the template
//! renderer, the record-text parser, and the use case that turns an
//! incoming query into a synthesized (or forwarded) response.
pub mod ports;
pub mod services;
pub mod use_cases;
