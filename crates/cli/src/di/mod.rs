use std::sync::Arc;
use synthdns_application::services::RuleSet;
use synthdns_application::use_cases::SynthesizeResponseUseCase;
use synthdns_domain::Config;
use synthdns_infrastructure::dns::forwarding::UdpUpstreamResolver;
use synthdns_infrastructure::dns::server::SynthesisServerHandler;
use synthdns_infrastructure::metadata::StaticMetadata;
use synthdns_infrastructure::metrics::SynthesisMetricsRecorder;

#[allow(dead_code)]
pub struct Services {
    pub handler: SynthesisServerHandler,
    pub metrics: Arc<SynthesisMetricsRecorder>,
}

impl Services {
    pub fn new(config: &Config, rules: Arc<RuleSet>) -> Self {
        let metrics = Arc::new(SynthesisMetricsRecorder::new());
        let upstream = Arc::new(UdpUpstreamResolver::new(
            config.upstream.timeout_ms,
            config.upstream.deadline_ms,
        ));
        let metadata = Arc::new(StaticMetadata::new(config.metadata.clone()));
        let server_label = format!(
            "dns://{}:{}",
            config.server.bind_address, config.server.dns_port
        );

        let use_case = Arc::new(SynthesizeResponseUseCase::new(
            rules,
            metrics.clone(),
            upstream,
            metadata,
            server_label,
            String::new(),
        ));

        Self {
            handler: SynthesisServerHandler::new(use_case),
            metrics,
        }
    }
}
