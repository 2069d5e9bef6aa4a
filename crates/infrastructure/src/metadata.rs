use std::collections::HashMap;
use synthdns_domain::MetadataSource;

/// Metadata provider backed by the static key/value table from the
/// server configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    values: HashMap<String, String>,
}

impl StaticMetadata {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl MetadataSource for StaticMetadata {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
