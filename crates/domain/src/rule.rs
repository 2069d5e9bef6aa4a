use crate::dns_types::{QueryClass, QueryType};
use crate::upstream::UpstreamAddr;
use crate::zone::{self, ZoneSet};
use std::fmt;

/// One response section of a DNS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Answer,
    Additional,
    Authority,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Answer => "answer",
            Section::Additional => "additional",
            Section::Authority => "authority",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controls whether a rule whose name patterns fail to match defers to
/// the next rule or terminates evaluation. An empty zone list means the
/// policy is disabled; the root zone enables it for every name.
#[derive(Debug, Clone, Default)]
pub struct FallthroughPolicy {
    zones: ZoneSet,
}

impl FallthroughPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Fallthrough for every zone.
    pub fn all() -> Self {
        Self {
            zones: ZoneSet::new(vec![".".to_string()]),
        }
    }

    /// Fallthrough only for the given zones; an empty list means all.
    pub fn for_zones(zones: Vec<String>) -> Self {
        if zones.is_empty() {
            Self::all()
        } else {
            Self {
                zones: ZoneSet::new(zones),
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.zones.is_empty()
    }

    /// Whether evaluation may continue past this rule for `qname`.
    pub fn covers(&self, qname: &str) -> bool {
        self.zones.matches(qname).is_some()
    }
}

/// A validated rule as produced by the directive parser. Regexes and
/// templates are still source text here; compilation happens once at
/// startup when the rule set is built.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub zones: Vec<String>,
    pub qclass: QueryClass,
    pub qtype: QueryType,
    pub patterns: Vec<String>,
    pub answers: Vec<String>,
    pub additionals: Vec<String>,
    pub authorities: Vec<String>,
    pub fallthrough: FallthroughPolicy,
    pub forward: Option<UpstreamAddr>,
}

impl RuleConfig {
    pub fn new(qclass: QueryClass, qtype: QueryType, zones: Vec<String>) -> Self {
        let zones = if zones.is_empty() {
            vec![".".to_string()]
        } else {
            zones.iter().map(|z| zone::normalize(z)).collect()
        };
        Self {
            zones,
            qclass,
            qtype,
            patterns: Vec::new(),
            answers: Vec::new(),
            additionals: Vec::new(),
            authorities: Vec::new(),
            fallthrough: FallthroughPolicy::disabled(),
            forward: None,
        }
    }
}
