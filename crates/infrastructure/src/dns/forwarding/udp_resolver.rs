//! UDP transport for per-rule upstream forwarding.
//!
//! One socket per attempt, dropped on scope exit, so a failed exchange
//! can never leak a connection. The retry loop is bounded by the
//! configured deadline and re-checks cancellation before each attempt.

use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use synthdns_domain::{DomainError, UpstreamAddr};
use synthdns_application::ports::UpstreamResolver;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct UdpUpstreamResolver {
    timeout: Duration,
    deadline: Duration,
}

impl UdpUpstreamResolver {
    pub fn new(timeout_ms: u64, deadline_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            deadline: Duration::from_millis(deadline_ms),
        }
    }

    async fn attempt(
        &self,
        addr: SocketAddr,
        payload: &[u8],
        server: &str,
    ) -> Result<Message, DomainError> {
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::Transport {
                server: server.to_string(),
                reason: format!("failed to bind socket: {}", e),
            }
        })?;

        socket.connect(addr).await.map_err(|e| DomainError::Transport {
            server: server.to_string(),
            reason: format!("failed to connect: {}", e),
        })?;

        socket.send(payload).await.map_err(|e| DomainError::Transport {
            server: server.to_string(),
            reason: format!("failed to send query: {}", e),
        })?;

        let mut response_buf = vec![0u8; 4096];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut response_buf))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::Transport {
                server: server.to_string(),
                reason: format!("failed to receive response: {}", e),
            })?;

        Message::from_vec(&response_buf[..len]).map_err(|e| DomainError::Transport {
            server: server.to_string(),
            reason: format!("failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl UpstreamResolver for UdpUpstreamResolver {
    async fn resolve(
        &self,
        target: &UpstreamAddr,
        query: &Message,
        cancel: &CancellationToken,
    ) -> Result<Message, DomainError> {
        let server = target.to_string();
        let addr = resolve_target(target, &server).await?;
        let payload = serialize_message(query, &server)?;

        let deadline = Instant::now() + self.deadline;
        let mut last_error = DomainError::UpstreamDeadline(server.clone());

        while Instant::now() < deadline {
            if cancel.is_cancelled() {
                debug!(server = %server, "Upstream resolution abandoned");
                return Err(DomainError::Cancelled);
            }

            match self.attempt(addr, &payload, &server).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!(server = %server, error = %e, "Upstream attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

async fn resolve_target(target: &UpstreamAddr, server: &str) -> Result<SocketAddr, DomainError> {
    match target {
        UpstreamAddr::Resolved(addr) => Ok(*addr),
        UpstreamAddr::Unresolved { hostname, port } => {
            let mut addrs = tokio::net::lookup_host((hostname.as_ref(), *port))
                .await
                .map_err(|e| DomainError::Transport {
                    server: server.to_string(),
                    reason: format!("failed to resolve target: {}", e),
                })?;
            addrs.next().ok_or_else(|| DomainError::Transport {
                server: server.to_string(),
                reason: "target resolved to no addresses".to_string(),
            })
        }
    }
}

fn serialize_message(message: &Message, server: &str) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).map_err(|e| DomainError::Transport {
        server: server.to_string(),
        reason: format!("failed to serialize query: {}", e),
    })?;
    Ok(buf)
}
