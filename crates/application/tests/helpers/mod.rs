#![allow(dead_code)]

mod mock_ports;

pub use mock_ports::{MockSynthesisMetrics, MockUpstreamResolver};

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use synthdns_domain::{
    EmptyMetadata, MatchContext, MessageInfo, MetadataSource, QueryClass, QueryType, QuestionInfo,
};
use synthdns_application::services::QueryInfo;

pub const CLIENT_IP: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(192, 168, 1, 100));

pub fn make_wire_query(id: u16, name: &str, record_type: RecordType) -> Message {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

pub fn make_query(name: &str, qclass: QueryClass, qtype: QueryType) -> QueryInfo {
    let name = name.to_ascii_lowercase();
    QueryInfo {
        name: name.clone(),
        qclass,
        qtype,
        remote: CLIENT_IP,
        question: QuestionInfo {
            name: name.clone(),
            class: qclass.label(),
            qtype: qtype.label(),
        },
        message: MessageInfo {
            id: 4711,
            opcode: "QUERY".to_string(),
            recursion_desired: true,
        },
        wire_query: make_wire_query(4711, &name, RecordType::A),
    }
}

pub fn make_context(name: &str) -> MatchContext {
    make_context_with_metadata(name, Arc::new(EmptyMetadata))
}

pub fn make_context_with_metadata(
    name: &str,
    metadata: Arc<dyn MetadataSource>,
) -> MatchContext {
    MatchContext {
        zone: "example.org.".to_string(),
        name: name.to_string(),
        regex: "^.*$".to_string(),
        captures: vec![name.to_string()],
        groups: HashMap::from([("0".to_string(), name.to_string())]),
        class: "IN".to_string(),
        qtype: "A".to_string(),
        question: QuestionInfo {
            name: name.to_string(),
            class: "IN".to_string(),
            qtype: "A".to_string(),
        },
        message: MessageInfo {
            id: 4711,
            opcode: "QUERY".to_string(),
            recursion_desired: true,
        },
        remote: CLIENT_IP.to_string(),
        metadata,
    }
}

pub struct MapMetadata(pub HashMap<String, String>);

impl MetadataSource for MapMetadata {
    fn value(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}
