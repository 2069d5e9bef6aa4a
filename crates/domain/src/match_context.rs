use std::collections::HashMap;
use std::sync::Arc;

/// Read-only accessor into request-scoped metadata supplied by the host
/// environment. Absent keys resolve to an empty string, never an error.
pub trait MetadataSource: Send + Sync {
    fn value(&self, key: &str) -> Option<String>;
}

/// The no-metadata default.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMetadata;

impl MetadataSource for EmptyMetadata {
    fn value(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Read-only view of the question that arrived on the wire.
#[derive(Debug, Clone)]
pub struct QuestionInfo {
    pub name: String,
    pub class: String,
    pub qtype: String,
}

/// Read-only view of the query message header.
#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub id: u16,
    pub opcode: String,
    pub recursion_desired: bool,
}

/// The structured data bag a matched rule exposes to its templates.
/// Valid only for the rule/pattern pair that produced it; built fresh
/// per query-evaluation attempt and consumed once.
///
/// `captures[0]` is always the whole matched substring, and `groups`
/// carries an entry for every capture index (as a stringified number)
/// plus one entry per named group.
#[derive(Clone)]
pub struct MatchContext {
    pub zone: String,
    pub name: String,
    pub regex: String,
    pub captures: Vec<String>,
    pub groups: HashMap<String, String>,
    pub class: String,
    pub qtype: String,
    pub question: QuestionInfo,
    pub message: MessageInfo,
    pub remote: String,
    pub metadata: Arc<dyn MetadataSource>,
}

impl MatchContext {
    /// Metadata lookup as exposed to templates: absent keys become "".
    pub fn meta(&self, key: &str) -> String {
        self.metadata.value(key).unwrap_or_default()
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("zone", &self.zone)
            .field("name", &self.name)
            .field("regex", &self.regex)
            .field("captures", &self.captures)
            .field("class", &self.class)
            .field("qtype", &self.qtype)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}
