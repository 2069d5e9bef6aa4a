mod helpers;

use helpers::{make_query, make_wire_query, MockSynthesisMetrics, MockUpstreamResolver};
use hickory_proto::op::{MessageType, ResponseCode};
use hickory_proto::rr::RecordType;
use std::sync::Arc;
use synthdns_application::services::{QueryInfo, RuleSet};
use synthdns_application::use_cases::{SynthesisOutcome, SynthesizeResponseUseCase};
use synthdns_domain::{
    parse_forward_target, DomainError, EmptyMetadata, FallthroughPolicy, QueryClass, QueryType,
    RuleConfig,
};
use tokio_util::sync::CancellationToken;

struct Fixture {
    use_case: SynthesizeResponseUseCase,
    metrics: Arc<MockSynthesisMetrics>,
    upstream: Arc<MockUpstreamResolver>,
}

fn fixture(configs: Vec<RuleConfig>) -> Fixture {
    let rules = Arc::new(RuleSet::compile(configs).unwrap());
    let metrics = Arc::new(MockSynthesisMetrics::new());
    let upstream = Arc::new(MockUpstreamResolver::new());
    let use_case = SynthesizeResponseUseCase::new(
        rules,
        metrics.clone(),
        upstream.clone(),
        Arc::new(EmptyMetadata),
        "dns://:53".to_string(),
        String::new(),
    );
    Fixture {
        use_case,
        metrics,
        upstream,
    }
}

fn a_rule(zone: &str) -> RuleConfig {
    let mut config = RuleConfig::new(QueryClass::IN, QueryType::A, vec![zone.to_string()]);
    config.answers = vec!["{{ .Name }} 60 IN A 10.0.0.1".to_string()];
    config
}

async fn run(fixture: &Fixture, query: &QueryInfo) -> SynthesisOutcome {
    fixture
        .use_case
        .execute(query, &CancellationToken::new())
        .await
}

// ── zone scoping ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_outside_all_zones_is_not_handled() {
    let f = fixture(vec![a_rule("example.org.")]);
    let query = make_query("host.other.net.", QueryClass::IN, QueryType::A);
    assert!(matches!(run(&f, &query).await, SynthesisOutcome::NotHandled));
    assert!(f.metrics.matches().is_empty());
}

#[tokio::test]
async fn test_zone_covered_but_no_rule_match_is_empty_success() {
    // Zone is covered by rule 1's origin, but the rule filters on type
    // AAAA, so evaluation exhausts the rule list.
    let mut config = RuleConfig::new(
        QueryClass::IN,
        QueryType::from_mnemonic("AAAA").unwrap(),
        vec!["example.org.".to_string()],
    );
    config.answers = vec!["{{ .Name }} 60 IN AAAA 2001:db8::1".to_string()];
    let f = fixture(vec![config]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);
    assert!(matches!(run(&f, &query).await, SynthesisOutcome::Empty));
}

// ── synthesis ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_match_synthesizes_answer() {
    let f = fixture(vec![a_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    match run(&f, &query).await {
        SynthesisOutcome::Synthesized(sections) => {
            assert_eq!(sections.answers.len(), 1);
            assert!(sections.additionals.is_empty());
            assert!(sections.authorities.is_empty());
            assert_eq!(sections.answers[0].name().to_utf8(), "host.example.org.");
            assert_eq!(sections.answers[0].ttl(), 60);
        }
        _ => panic!("expected synthesized outcome"),
    }

    let matches = f.metrics.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].zone, "example.org.");
    assert_eq!(matches[0].class, "IN");
    assert_eq!(matches[0].qtype, "A");
}

#[tokio::test]
async fn test_first_full_match_wins_over_later_rules() {
    let mut first = a_rule("example.org.");
    first.answers = vec!["{{ .Name }} 60 IN A 10.0.0.1".to_string()];
    let mut second = a_rule("example.org.");
    second.answers = vec!["{{ .Name }} 60 IN A 10.0.0.2".to_string()];

    let f = fixture(vec![first, second]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    match run(&f, &query).await {
        SynthesisOutcome::Synthesized(sections) => {
            assert_eq!(sections.answers.len(), 1);
            match sections.answers[0].data() {
                hickory_proto::rr::RData::A(a) => assert_eq!(a.0.to_string(), "10.0.0.1"),
                other => panic!("expected A rdata, got {:?}", other),
            }
        }
        _ => panic!("expected synthesized outcome"),
    }
    assert_eq!(f.metrics.matches().len(), 1);
}

#[tokio::test]
async fn test_all_three_sections_render_in_order() {
    let mut config = a_rule("example.org.");
    config.additionals = vec!["extra.example.org. 60 IN A 10.0.0.9".to_string()];
    config.authorities =
        vec!["example.org. 60 IN NS ns.example.org.".to_string()];
    let f = fixture(vec![config]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    match run(&f, &query).await {
        SynthesisOutcome::Synthesized(sections) => {
            assert_eq!(sections.answers.len(), 1);
            assert_eq!(sections.additionals.len(), 1);
            assert_eq!(sections.authorities.len(), 1);
        }
        _ => panic!("expected synthesized outcome"),
    }
}

#[tokio::test]
async fn test_idempotent_evaluation() {
    let f = fixture(vec![a_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    let first = match run(&f, &query).await {
        SynthesisOutcome::Synthesized(s) => s.answers,
        _ => panic!("expected synthesized outcome"),
    };
    let second = match run(&f, &query).await {
        SynthesisOutcome::Synthesized(s) => s.answers,
        _ => panic!("expected synthesized outcome"),
    };
    assert_eq!(first, second);
}

// ── failure isolation ──────────────────────────────────────────────────

#[tokio::test]
async fn test_render_failure_aborts_whole_response() {
    let mut config = a_rule("example.org.");
    config.answers = vec![
        "{{ .Name }} 60 IN A 10.0.0.1".to_string(),
        "{{ .Undefined }} 60 IN A 10.0.0.2".to_string(),
    ];
    let f = fixture(vec![config]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, error } => {
            assert_eq!(rcode, ResponseCode::ServFail);
            assert!(matches!(error, DomainError::TemplateRender(_)));
        }
        _ => panic!("expected failure outcome"),
    }

    // Exactly one render failure, attributed to the failing template only.
    let failures = f.metrics.render_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].template, "{{ .Undefined }} 60 IN A 10.0.0.2");
    assert!(f.metrics.rr_failures().is_empty());
}

#[tokio::test]
async fn test_record_parse_failure_counted_separately() {
    let mut config = a_rule("example.org.");
    config.answers = vec!["{{ .Name }} 60 IN A not-an-address".to_string()];
    let f = fixture(vec![config]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, error } => {
            assert_eq!(rcode, ResponseCode::ServFail);
            assert!(matches!(error, DomainError::RecordParse(_)));
        }
        _ => panic!("expected failure outcome"),
    }

    assert!(f.metrics.render_failures().is_empty());
    assert_eq!(f.metrics.rr_failures().len(), 1);
}

// ── fallthrough chain ──────────────────────────────────────────────────

#[tokio::test]
async fn test_fallthrough_enables_later_rule() {
    let mut r1 = a_rule("a.example.");
    r1.patterns = vec![r"^x\.".to_string()];
    r1.fallthrough = FallthroughPolicy::for_zones(vec!["a.example.".to_string()]);
    let mut r2 = a_rule("a.example.");
    r2.patterns = vec![r".*".to_string()];

    let f = fixture(vec![r1, r2]);
    let query = make_query("y.a.example.", QueryClass::IN, QueryType::A);
    assert!(matches!(
        run(&f, &query).await,
        SynthesisOutcome::Synthesized(_)
    ));
}

#[tokio::test]
async fn test_no_fallthrough_terminates_before_later_rule() {
    let mut r1 = a_rule("a.example.");
    r1.patterns = vec![r"^x\.".to_string()];
    let mut r2 = a_rule("a.example.");
    r2.patterns = vec![r".*".to_string()];

    let f = fixture(vec![r1, r2]);
    let query = make_query("y.a.example.", QueryClass::IN, QueryType::A);
    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, error } => {
            assert_eq!(rcode, ResponseCode::ServFail);
            assert!(matches!(error, DomainError::RuleTerminalMismatch(_)));
        }
        _ => panic!("expected failure outcome"),
    }
    // R2 never ran: no match was recorded.
    assert!(f.metrics.matches().is_empty());
}

// ── upstream forwarding ────────────────────────────────────────────────

fn forward_rule(zone: &str) -> RuleConfig {
    let mut config = RuleConfig::new(QueryClass::IN, QueryType::A, vec![zone.to_string()]);
    config.forward = Some(parse_forward_target("10.1.1.1:53").unwrap());
    config
}

#[tokio::test]
async fn test_forward_relays_matching_reply() {
    let f = fixture(vec![forward_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    let mut reply = make_wire_query(4711, "host.example.org.", RecordType::A);
    reply.set_message_type(MessageType::Response);
    f.upstream.set_reply(reply);

    match run(&f, &query).await {
        SynthesisOutcome::Forwarded(msg) => assert_eq!(msg.id(), 4711),
        _ => panic!("expected forwarded outcome"),
    }
    assert_eq!(f.upstream.calls(), 1);
}

#[tokio::test]
async fn test_forward_reply_id_mismatch_is_form_error() {
    let f = fixture(vec![forward_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    let mut reply = make_wire_query(9999, "host.example.org.", RecordType::A);
    reply.set_message_type(MessageType::Response);
    f.upstream.set_reply(reply);

    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, error } => {
            assert_eq!(rcode, ResponseCode::FormErr);
            assert!(matches!(error, DomainError::UpstreamMismatch));
        }
        _ => panic!("expected failure outcome"),
    }
}

#[tokio::test]
async fn test_forward_reply_question_mismatch_is_form_error() {
    let f = fixture(vec![forward_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    let mut reply = make_wire_query(4711, "other.example.org.", RecordType::A);
    reply.set_message_type(MessageType::Response);
    f.upstream.set_reply(reply);

    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, .. } => assert_eq!(rcode, ResponseCode::FormErr),
        _ => panic!("expected failure outcome"),
    }
}

#[tokio::test]
async fn test_forward_transport_failure_is_server_failure() {
    let f = fixture(vec![forward_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    f.upstream
        .set_error(DomainError::UpstreamDeadline("10.1.1.1:53".to_string()));

    match run(&f, &query).await {
        SynthesisOutcome::Failure { rcode, .. } => assert_eq!(rcode, ResponseCode::ServFail),
        _ => panic!("expected failure outcome"),
    }
}

#[tokio::test]
async fn test_cancelled_forward_is_abandoned() {
    let f = fixture(vec![forward_rule("example.org.")]);
    let query = make_query("host.example.org.", QueryClass::IN, QueryType::A);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = f.use_case.execute(&query, &cancel).await;
    assert!(matches!(outcome, SynthesisOutcome::Abandoned));
}
