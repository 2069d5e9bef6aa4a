use super::template_engine::Template;
use fancy_regex::Regex;
use synthdns_domain::{
    ConfigError, FallthroughPolicy, QueryClass, QueryType, RuleConfig, Section, UpstreamAddr,
    ZoneSet,
};

/// A rule with its regexes and templates compiled, ready for matching.
/// Built once at startup and shared read-only across queries.
pub struct CompiledRule {
    pub zones: ZoneSet,
    pub qclass: QueryClass,
    pub qtype: QueryType,
    pub patterns: Vec<Regex>,
    pub answers: Vec<Template>,
    pub additionals: Vec<Template>,
    pub authorities: Vec<Template>,
    pub fallthrough: FallthroughPolicy,
    pub forward: Option<UpstreamAddr>,
}

impl CompiledRule {
    pub fn templates(&self, section: Section) -> &[Template] {
        match section {
            Section::Answer => &self.answers,
            Section::Additional => &self.additionals,
            Section::Authority => &self.authorities,
        }
    }
}

/// The ordered, immutable rule set plus the union of all configured
/// zone origins (used for the outer fast-reject check).
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    origins: ZoneSet,
}

impl RuleSet {
    pub fn compile(configs: Vec<RuleConfig>) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(configs.len());
        let mut origins = ZoneSet::default();

        for config in configs {
            origins.extend(&config.zones);

            let pattern_sources = if config.patterns.is_empty() {
                vec![".*".to_string()]
            } else {
                config.patterns
            };
            let mut patterns = Vec::with_capacity(pattern_sources.len());
            for source in &pattern_sources {
                let regex = Regex::new(source).map_err(|e| ConfigError::InvalidRegex {
                    pattern: source.clone(),
                    reason: e.to_string(),
                })?;
                patterns.push(regex);
            }

            rules.push(CompiledRule {
                zones: ZoneSet::new(config.zones),
                qclass: config.qclass,
                qtype: config.qtype,
                patterns,
                answers: compile_section(Section::Answer, &config.answers)?,
                additionals: compile_section(Section::Additional, &config.additionals)?,
                authorities: compile_section(Section::Authority, &config.authorities)?,
                fallthrough: config.fallthrough,
                forward: config.forward,
            });
        }

        Ok(Self { rules, origins })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn origins(&self) -> &ZoneSet {
        &self.origins
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_section(section: Section, sources: &[String]) -> Result<Vec<Template>, ConfigError> {
    sources
        .iter()
        .map(|source| Template::compile(section.as_str(), source))
        .collect()
}
