//! End-to-end evaluation: rule directive text is parsed, compiled, and
//! driven through the use case with the real metrics recorder. No
//! network involved; upstream resolution is stubbed.

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use synthdns_application::ports::UpstreamResolver;
use synthdns_application::services::{QueryInfo, RuleSet};
use synthdns_application::use_cases::{SynthesisOutcome, SynthesizeResponseUseCase};
use synthdns_domain::{
    DomainError, MessageInfo, MetadataSource, QueryClass, QueryType, QuestionInfo, UpstreamAddr,
};
use synthdns_infrastructure::config::parse_rules;
use synthdns_infrastructure::metadata::StaticMetadata;
use synthdns_infrastructure::metrics::SynthesisMetricsRecorder;
use tokio_util::sync::CancellationToken;

struct EchoUpstream;

#[async_trait]
impl UpstreamResolver for EchoUpstream {
    async fn resolve(
        &self,
        _target: &UpstreamAddr,
        query: &Message,
        _cancel: &CancellationToken,
    ) -> Result<Message, DomainError> {
        let mut reply = query.clone();
        reply.set_message_type(MessageType::Response);
        Ok(reply)
    }
}

fn make_query(name: &str, qtype: QueryType) -> QueryInfo {
    let name = name.to_ascii_lowercase();
    let mut query = Query::new();
    query.set_name(Name::from_str(&name).unwrap());
    query.set_query_type(RecordType::from(qtype.0));
    query.set_query_class(DNSClass::IN);
    let mut wire_query = Message::new(7001, MessageType::Query, OpCode::Query);
    wire_query.set_recursion_desired(true);
    wire_query.add_query(query);

    QueryInfo {
        name: name.clone(),
        qclass: QueryClass::IN,
        qtype,
        remote: IpAddr::from([127, 0, 0, 1]),
        question: QuestionInfo {
            name: name.clone(),
            class: "IN".to_string(),
            qtype: qtype.label(),
        },
        message: MessageInfo {
            id: 7001,
            opcode: "QUERY".to_string(),
            recursion_desired: true,
        },
        wire_query,
    }
}

fn build_engine(
    rules_text: &str,
    metadata: Arc<dyn MetadataSource>,
) -> (SynthesizeResponseUseCase, Arc<SynthesisMetricsRecorder>) {
    let configs = parse_rules(rules_text).unwrap();
    let rules = Arc::new(RuleSet::compile(configs).unwrap());
    let metrics = Arc::new(SynthesisMetricsRecorder::new());
    let use_case = SynthesizeResponseUseCase::new(
        rules,
        metrics.clone(),
        Arc::new(EchoUpstream),
        metadata,
        "dns://0.0.0.0:1053".to_string(),
        String::new(),
    );
    (use_case, metrics)
}

const RULES: &str = r#"
addition IN A example.org. {
    match "^ip-(?P<octet>[0-9]+)[.]example[.]org[.]$"
    answer "{{ .Name }} 60 IN A 10.0.0.{{ parseInt (index .Match 1) }}"
    fallthrough example.org.
}

addition IN A example.org. {
    answer "{{ .Name }} 300 IN A 192.0.2.7"
    authority "example.org. 300 IN NS ns.example.org."
}
"#;

#[tokio::test]
async fn test_capture_driven_synthesis() {
    let (engine, metrics) = build_engine(RULES, Arc::new(StaticMetadata::default()));
    let query = make_query("ip-23.example.org.", QueryType::A);

    match engine.execute(&query, &CancellationToken::new()).await {
        SynthesisOutcome::Synthesized(sections) => {
            assert_eq!(sections.answers.len(), 1);
            let record = &sections.answers[0];
            assert_eq!(record.name().to_utf8(), "ip-23.example.org.");
            assert_eq!(record.ttl(), 60);
            match record.data() {
                RData::A(a) => assert_eq!(a.0.to_string(), "10.0.0.23"),
                other => panic!("expected A rdata, got {:?}", other),
            }
        }
        _ => panic!("expected synthesized outcome"),
    }
    assert_eq!(metrics.matches_total(), 1);
}

#[tokio::test]
async fn test_fallthrough_reaches_catch_all_rule() {
    let (engine, _) = build_engine(RULES, Arc::new(StaticMetadata::default()));
    let query = make_query("web.example.org.", QueryType::A);

    match engine.execute(&query, &CancellationToken::new()).await {
        SynthesisOutcome::Synthesized(sections) => {
            assert_eq!(sections.answers.len(), 1);
            assert_eq!(sections.answers[0].ttl(), 300);
            assert_eq!(sections.authorities.len(), 1);
            assert_eq!(sections.authorities[0].record_type(), RecordType::NS);
        }
        _ => panic!("expected synthesized outcome"),
    }
}

#[tokio::test]
async fn test_outside_zone_is_not_handled() {
    let (engine, metrics) = build_engine(RULES, Arc::new(StaticMetadata::default()));
    let query = make_query("host.example.net.", QueryType::A);

    assert!(matches!(
        engine.execute(&query, &CancellationToken::new()).await,
        SynthesisOutcome::NotHandled
    ));
    assert_eq!(metrics.matches_total(), 0);
}

#[tokio::test]
async fn test_render_failure_counts_against_failing_template() {
    let rules = r#"
addition IN A example.org. {
    answer "{{ .Name }} 60 IN A 10.0.0.1"
    answer "{{ .Missing }} 60 IN A 10.0.0.2"
}
"#;
    let (engine, metrics) = build_engine(rules, Arc::new(StaticMetadata::default()));
    let query = make_query("host.example.org.", QueryType::A);

    match engine.execute(&query, &CancellationToken::new()).await {
        SynthesisOutcome::Failure { rcode, .. } => assert_eq!(rcode, ResponseCode::ServFail),
        _ => panic!("expected failure outcome"),
    }
    assert_eq!(metrics.render_failures_total(), 1);
    assert_eq!(metrics.rr_failures_total(), 0);
}

#[tokio::test]
async fn test_metadata_reaches_templates() {
    let rules = r#"
addition IN TXT example.org. {
    answer "{{ .Name }} 60 IN TXT \"{{ .Meta \"site\" }}\""
}
"#;
    let metadata = StaticMetadata::new(
        [("site".to_string(), "eu-west".to_string())].into_iter().collect(),
    );
    let (engine, _) = build_engine(rules, Arc::new(metadata));
    let query = make_query("host.example.org.", QueryType::from_mnemonic("TXT").unwrap());

    match engine.execute(&query, &CancellationToken::new()).await {
        SynthesisOutcome::Synthesized(sections) => match sections.answers[0].data() {
            RData::TXT(txt) => {
                let joined: Vec<String> = txt
                    .txt_data()
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).to_string())
                    .collect();
                assert_eq!(joined, vec!["eu-west".to_string()]);
            }
            other => panic!("expected TXT rdata, got {:?}", other),
        },
        _ => panic!("expected synthesized outcome"),
    }
}

#[tokio::test]
async fn test_forward_rule_relays_upstream_reply() {
    let rules = r#"
addition IN A proxy.example.org. {
    forward 10.9.9.9:53
}
"#;
    let (engine, _) = build_engine(rules, Arc::new(StaticMetadata::default()));
    let query = make_query("db.proxy.example.org.", QueryType::A);

    match engine.execute(&query, &CancellationToken::new()).await {
        SynthesisOutcome::Forwarded(reply) => {
            assert_eq!(reply.id(), 7001);
            assert_eq!(
                reply.queries()[0].name().to_utf8(),
                "db.proxy.example.org."
            );
        }
        _ => panic!("expected forwarded outcome"),
    }
}
