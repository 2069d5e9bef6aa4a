use super::rule_set::CompiledRule;
use fancy_regex::{Captures, Regex};
use hickory_proto::op::Message;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use synthdns_domain::{
    MatchContext, MessageInfo, MetadataSource, QueryClass, QueryType, QuestionInfo,
};
use tracing::debug;

/// Immutable per-query input, built by the server handler from the
/// incoming request. `name` is the normalized (lowercased, rooted)
/// query name that matching and capturing run against.
#[derive(Clone)]
pub struct QueryInfo {
    pub name: String,
    pub qclass: QueryClass,
    pub qtype: QueryType,
    pub remote: IpAddr,
    pub question: QuestionInfo,
    pub message: MessageInfo,
    /// The query as a protocol message, reused when the matched rule
    /// forwards upstream instead of synthesizing.
    pub wire_query: Message,
}

/// Tri-state result of testing one rule against a query.
pub enum RuleMatch {
    Matched(MatchContext),
    /// Rule does not apply; evaluation advances to the next rule.
    Continue,
    /// Name patterns failed and fallthrough does not cover this name;
    /// evaluation stops with a server failure.
    Terminate,
}

/// Tests a single rule's zone, class, type, and name constraints.
/// Zone and class/type mismatches skip the rule without consuming a
/// fallthrough decision; only a name-pattern miss consults the policy.
pub fn match_rule(
    rule: &CompiledRule,
    query: &QueryInfo,
    metadata: &Arc<dyn MetadataSource>,
) -> RuleMatch {
    let Some(zone) = rule.zones.matches(&query.name) else {
        return RuleMatch::Continue;
    };

    if !rule.qclass.accepts(query.qclass) || !rule.qtype.accepts(query.qtype) {
        return RuleMatch::Continue;
    }

    let zone = zone.to_string();
    for regex in &rule.patterns {
        match regex.captures(&query.name) {
            Ok(Some(captures)) => {
                return RuleMatch::Matched(build_context(
                    rule, regex, &captures, zone, query, metadata,
                ));
            }
            Ok(None) => {}
            Err(e) => {
                // Runtime regex failure (e.g. backtracking limit) is
                // treated as a non-match for this pattern.
                debug!(pattern = regex.as_str(), error = %e, "Pattern match aborted");
            }
        }
    }

    if rule.fallthrough.covers(&query.name) {
        RuleMatch::Continue
    } else {
        RuleMatch::Terminate
    }
}

fn build_context(
    rule: &CompiledRule,
    regex: &Regex,
    captures: &Captures<'_>,
    zone: String,
    query: &QueryInfo,
    metadata: &Arc<dyn MetadataSource>,
) -> MatchContext {
    let capture_texts: Vec<String> = (0..captures.len())
        .map(|i| {
            captures
                .get(i)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .collect();

    let mut groups = HashMap::with_capacity(capture_texts.len());
    for (i, text) in capture_texts.iter().enumerate() {
        groups.insert(i.to_string(), text.clone());
    }
    for (i, name) in regex.capture_names().enumerate() {
        if let Some(name) = name {
            if !name.is_empty() {
                groups.insert(
                    name.to_string(),
                    capture_texts.get(i).cloned().unwrap_or_default(),
                );
            }
        }
    }

    // The concrete side wins: a wildcard query resolves to the rule's
    // configured class/type string, and vice versa.
    let class = if !query.qclass.is_any() {
        query.qclass.label()
    } else {
        rule.qclass.label()
    };
    let qtype = if !query.qtype.is_any() {
        query.qtype.label()
    } else {
        rule.qtype.label()
    };

    MatchContext {
        zone,
        name: query.name.clone(),
        regex: regex.as_str().to_string(),
        captures: capture_texts,
        groups,
        class,
        qtype,
        question: query.question.clone(),
        message: query.message.clone(),
        remote: query.remote.to_string(),
        metadata: Arc::clone(metadata),
    }
}
