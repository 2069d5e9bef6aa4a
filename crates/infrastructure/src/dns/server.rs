use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::Record;
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::sync::Arc;
use synthdns_application::services::QueryInfo;
use synthdns_application::use_cases::{SynthesisOutcome, SynthesizeResponseUseCase};
use synthdns_domain::{zone, MessageInfo, QueryClass, QueryType, QuestionInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Bridges the hickory server to the rule evaluation engine: builds the
/// per-query input, runs the use case, and writes exactly one response
/// for every outcome that produces one.
#[derive(Clone)]
pub struct SynthesisServerHandler {
    use_case: Arc<SynthesizeResponseUseCase>,
}

impl SynthesisServerHandler {
    pub fn new(use_case: Arc<SynthesizeResponseUseCase>) -> Self {
        Self { use_case }
    }
}

#[async_trait::async_trait]
impl RequestHandler for SynthesisServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let request_info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "Failed to parse request info");
                return send_error_response(request, &mut response_handle, ResponseCode::FormErr)
                    .await;
            }
        };

        let original = request_info.query.original();
        let header = request.header();

        let name = zone::normalize(&request_info.query.name().to_utf8());
        let qclass = QueryClass(u16::from(original.query_class()));
        let qtype = QueryType(u16::from(original.query_type()));
        let remote = request.src().ip();

        debug!(name = %name, qtype = %qtype, client = %remote, "DNS query received");

        let mut wire_query = Message::new(header.id(), MessageType::Query, OpCode::Query);
        wire_query.set_recursion_desired(header.recursion_desired());
        wire_query.add_query(original.clone());

        let query = QueryInfo {
            name,
            qclass,
            qtype,
            remote,
            question: QuestionInfo {
                name: original.name().to_utf8(),
                class: qclass.label(),
                qtype: qtype.label(),
            },
            message: MessageInfo {
                id: header.id(),
                opcode: opcode_label(header.op_code()),
                recursion_desired: header.recursion_desired(),
            },
            wire_query,
        };

        let cancel = CancellationToken::new();
        match self.use_case.execute(&query, &cancel).await {
            SynthesisOutcome::NotHandled => {
                // No next handler in a standalone deployment; refuse.
                warn!(name = %query.name, "Query outside configured zones");
                send_error_response(request, &mut response_handle, ResponseCode::Refused).await
            }
            SynthesisOutcome::Empty => {
                let builder = MessageResponseBuilder::from_message_request(request);
                let mut header = *request.header();
                header.set_authoritative(true);
                let response = builder.build(header, &[], &[] as &[Record], &[], &[]);
                match response_handle.send_response(response).await {
                    Ok(info) => info,
                    Err(e) => {
                        error!(error = %e, "Failed to send empty response");
                        ResponseInfo::from(*request.header())
                    }
                }
            }
            SynthesisOutcome::Synthesized(sections) => {
                debug!(
                    name = %query.name,
                    answers = sections.answers.len(),
                    additionals = sections.additionals.len(),
                    authorities = sections.authorities.len(),
                    "Sending synthesized response"
                );
                let builder = MessageResponseBuilder::from_message_request(request);
                let mut header = *request.header();
                header.set_authoritative(true);
                let response = builder.build(
                    header,
                    sections.answers.iter(),
                    sections.authorities.iter(),
                    &[],
                    sections.additionals.iter(),
                );
                match response_handle.send_response(response).await {
                    Ok(info) => info,
                    Err(e) => {
                        error!(error = %e, "Failed to send response");
                        ResponseInfo::from(*request.header())
                    }
                }
            }
            SynthesisOutcome::Forwarded(reply) => {
                debug!(name = %query.name, rcode = ?reply.response_code(), "Relaying upstream reply");
                let builder = MessageResponseBuilder::from_message_request(request);
                let mut header = *request.header();
                header.set_response_code(reply.response_code());
                header.set_authoritative(reply.authoritative());
                header.set_recursion_available(reply.recursion_available());
                let response = builder.build(
                    header,
                    reply.answers().iter(),
                    reply.name_servers().iter(),
                    &[],
                    reply.additionals().iter(),
                );
                match response_handle.send_response(response).await {
                    Ok(info) => info,
                    Err(e) => {
                        error!(error = %e, "Failed to relay upstream reply");
                        ResponseInfo::from(*request.header())
                    }
                }
            }
            SynthesisOutcome::Failure { rcode, error } => {
                warn!(name = %query.name, error = %error, "Query failed");
                send_error_response(request, &mut response_handle, rcode).await
            }
            SynthesisOutcome::Abandoned => {
                debug!(name = %query.name, "Query abandoned, writing no response");
                ResponseInfo::from(*request.header())
            }
        }
    }
}

fn opcode_label(opcode: OpCode) -> String {
    match opcode {
        OpCode::Query => "QUERY".to_string(),
        OpCode::Status => "STATUS".to_string(),
        OpCode::Notify => "NOTIFY".to_string(),
        OpCode::Update => "UPDATE".to_string(),
        other => format!("{:?}", other).to_ascii_uppercase(),
    }
}

async fn send_error_response<R: ResponseHandler>(
    request: &Request,
    response_handle: &mut R,
    code: ResponseCode,
) -> ResponseInfo {
    debug!(code = ?code, "Sending error response");
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = *request.header();
    header.set_response_code(code);
    let response = builder.build(header, &[], &[], &[], &[]);

    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "Failed to send error response");
            ResponseInfo::from(*request.header())
        }
    }
}
