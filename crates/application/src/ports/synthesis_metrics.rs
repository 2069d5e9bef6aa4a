use synthdns_domain::Section;

/// Labels attached to every successful rule match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchLabels {
    pub server: String,
    pub zone: String,
    pub view: String,
    pub class: String,
    pub qtype: String,
}

/// Labels attached to a template render or record parse failure. The
/// `template` field carries the source text of the failing template so
/// counters stay distinguishable per template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateLabels {
    pub server: String,
    pub zone: String,
    pub view: String,
    pub class: String,
    pub qtype: String,
    pub section: Section,
    pub template: String,
}

/// Observability collaborator. Implementations must be safe to call
/// from concurrently executing queries.
pub trait SynthesisMetrics: Send + Sync {
    fn record_match(&self, labels: &MatchLabels);
    fn record_render_failure(&self, labels: &TemplateLabels);
    fn record_rr_failure(&self, labels: &TemplateLabels);
}
