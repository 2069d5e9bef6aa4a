pub mod record_parser;
pub mod rule_matcher;
pub mod rule_set;
pub mod template_engine;

pub use record_parser::{parse_record, record_to_text};
pub use rule_matcher::{match_rule, QueryInfo, RuleMatch};
pub use rule_set::{CompiledRule, RuleSet};
pub use template_engine::Template;
