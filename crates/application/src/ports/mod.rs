mod synthesis_metrics;
mod upstream_resolver;

pub use synthesis_metrics::{MatchLabels, SynthesisMetrics, TemplateLabels};
pub use upstream_resolver::UpstreamResolver;
