mod rules_parser;

pub use rules_parser::parse_rules;
