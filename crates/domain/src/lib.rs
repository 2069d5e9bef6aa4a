//! SynthDNS Domain Layer
pub mod config;
pub mod dns_types;
pub mod errors;
pub mod match_context;
pub mod rule;
pub mod upstream;
pub mod zone;

pub use config::{CliOverrides, Config};
pub use dns_types::{QueryClass, QueryType};
pub use errors::{ConfigError, DomainError};
pub use match_context::{EmptyMetadata, MatchContext, MessageInfo, MetadataSource, QuestionInfo};
pub use rule::{FallthroughPolicy, RuleConfig, Section};
pub use upstream::{parse_forward_target, UpstreamAddr};
pub use zone::ZoneSet;
