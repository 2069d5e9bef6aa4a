use async_trait::async_trait;
use hickory_proto::op::Message;
use synthdns_domain::{DomainError, UpstreamAddr};
use tokio_util::sync::CancellationToken;

/// Proxies a query to a forwarding target and returns the upstream
/// reply. Retry policy belongs to the implementation but must be
/// bounded by a deadline, and every attempt must re-check `cancel`
/// first so a cancelled query never spins past its own lifetime.
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    async fn resolve(
        &self,
        target: &UpstreamAddr,
        query: &Message,
        cancel: &CancellationToken,
    ) -> Result<Message, DomainError>;
}
