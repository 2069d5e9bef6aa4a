use crate::ports::{MatchLabels, SynthesisMetrics, TemplateLabels, UpstreamResolver};
use crate::services::rule_matcher::{match_rule, QueryInfo, RuleMatch};
use crate::services::rule_set::{CompiledRule, RuleSet};
use crate::services::{parse_record, Template};
use hickory_proto::op::{Message, ResponseCode, UpdateMessage};
use hickory_proto::rr::Record;
use std::sync::Arc;
use synthdns_domain::{DomainError, MatchContext, MetadataSource, Section, UpstreamAddr};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Rendered records grouped by destination section.
#[derive(Debug, Default)]
pub struct SynthesizedSections {
    pub answers: Vec<Record>,
    pub additionals: Vec<Record>,
    pub authorities: Vec<Record>,
}

/// What the evaluator decided for one query. The caller owns turning
/// this into exactly one wire response (or, for `NotHandled`, passing
/// the query on unchanged).
pub enum SynthesisOutcome {
    /// Query name lies outside every configured zone.
    NotHandled,
    /// Zone-covered query that no rule wanted; success with no records.
    Empty,
    /// First fully matching rule rendered its sections.
    Synthesized(SynthesizedSections),
    /// The matched rule forwarded upstream; relay this reply verbatim.
    Forwarded(Message),
    /// Recoverable per-query failure, answered with `rcode`.
    Failure {
        rcode: ResponseCode,
        error: DomainError,
    },
    /// Query was cancelled; write nothing.
    Abandoned,
}

/// Walks the rule set in configured order and commits to the first
/// full match: either proxying to the rule's forwarding target or
/// rendering the rule's templates into response sections.
pub struct SynthesizeResponseUseCase {
    rules: Arc<RuleSet>,
    metrics: Arc<dyn SynthesisMetrics>,
    upstream: Arc<dyn UpstreamResolver>,
    metadata: Arc<dyn MetadataSource>,
    server: String,
    view: String,
}

impl SynthesizeResponseUseCase {
    pub fn new(
        rules: Arc<RuleSet>,
        metrics: Arc<dyn SynthesisMetrics>,
        upstream: Arc<dyn UpstreamResolver>,
        metadata: Arc<dyn MetadataSource>,
        server: String,
        view: String,
    ) -> Self {
        Self {
            rules,
            metrics,
            upstream,
            metadata,
            server,
            view,
        }
    }

    pub async fn execute(&self, query: &QueryInfo, cancel: &CancellationToken) -> SynthesisOutcome {
        if self.rules.origins().matches(&query.name).is_none() {
            debug!(name = %query.name, "Query outside configured zones");
            return SynthesisOutcome::NotHandled;
        }

        for rule in self.rules.rules() {
            match match_rule(rule, query, &self.metadata) {
                RuleMatch::Continue => continue,
                RuleMatch::Terminate => {
                    return SynthesisOutcome::Failure {
                        rcode: ResponseCode::ServFail,
                        error: DomainError::RuleTerminalMismatch(query.name.clone()),
                    };
                }
                RuleMatch::Matched(ctx) => {
                    self.metrics.record_match(&MatchLabels {
                        server: self.server.clone(),
                        zone: ctx.zone.clone(),
                        view: self.view.clone(),
                        class: ctx.class.clone(),
                        qtype: ctx.qtype.clone(),
                    });

                    if let Some(target) = &rule.forward {
                        return self.forward(target, query, cancel).await;
                    }

                    return self.synthesize(rule, &ctx);
                }
            }
        }

        SynthesisOutcome::Empty
    }

    fn synthesize(&self, rule: &CompiledRule, ctx: &MatchContext) -> SynthesisOutcome {
        let mut sections = SynthesizedSections::default();
        for section in [Section::Answer, Section::Additional, Section::Authority] {
            let out = match section {
                Section::Answer => &mut sections.answers,
                Section::Additional => &mut sections.additionals,
                Section::Authority => &mut sections.authorities,
            };
            for template in rule.templates(section) {
                match self.render_one(template, section, ctx) {
                    Ok(record) => out.push(record),
                    Err(error) => {
                        return SynthesisOutcome::Failure {
                            rcode: ResponseCode::ServFail,
                            error,
                        };
                    }
                }
            }
        }
        SynthesisOutcome::Synthesized(sections)
    }

    fn render_one(
        &self,
        template: &Template,
        section: Section,
        ctx: &MatchContext,
    ) -> Result<Record, DomainError> {
        let labels = TemplateLabels {
            server: self.server.clone(),
            zone: ctx.zone.clone(),
            view: self.view.clone(),
            class: ctx.class.clone(),
            qtype: ctx.qtype.clone(),
            section,
            template: template.source().to_string(),
        };

        let text = template.render(ctx).inspect_err(|e| {
            self.metrics.record_render_failure(&labels);
            warn!(section = %section, error = %e, "Template render failed");
        })?;

        parse_record(&text).inspect_err(|e| {
            self.metrics.record_rr_failure(&labels);
            warn!(section = %section, text = %text, error = %e, "Rendered text is not a valid record");
        })
    }

    async fn forward(
        &self,
        target: &UpstreamAddr,
        query: &QueryInfo,
        cancel: &CancellationToken,
    ) -> SynthesisOutcome {
        debug!(name = %query.name, target = %target, "Forwarding query upstream");

        let reply = match self.upstream.resolve(target, &query.wire_query, cancel).await {
            Ok(reply) => reply,
            Err(DomainError::Cancelled) => return SynthesisOutcome::Abandoned,
            Err(error) => {
                warn!(name = %query.name, target = %target, error = %error, "Upstream resolution failed");
                return SynthesisOutcome::Failure {
                    rcode: ResponseCode::ServFail,
                    error,
                };
            }
        };

        if !reply_matches_query(&reply, &query.wire_query) {
            warn!(
                reply_id = reply.id(),
                query_id = query.wire_query.id(),
                name = %query.name,
                "Upstream reply does not correspond to the query"
            );
            return SynthesisOutcome::Failure {
                rcode: ResponseCode::FormErr,
                error: DomainError::UpstreamMismatch,
            };
        }

        SynthesisOutcome::Forwarded(reply)
    }
}

/// A relayed reply is only accepted when its transaction id and
/// question both match the original query.
fn reply_matches_query(reply: &Message, query: &Message) -> bool {
    if reply.id() != query.id() {
        return false;
    }
    let (Some(expected), Some(got)) = (query.queries.first(), reply.queries.first()) else {
        return false;
    };
    expected.name() == got.name()
        && expected.query_type() == got.query_type()
        && expected.query_class() == got.query_class()
}
