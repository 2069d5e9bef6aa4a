#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use synthdns_application::ports::{
    MatchLabels, SynthesisMetrics, TemplateLabels, UpstreamResolver,
};
use synthdns_domain::{DomainError, UpstreamAddr};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct MockSynthesisMetrics {
    matches: Mutex<Vec<MatchLabels>>,
    render_failures: Mutex<Vec<TemplateLabels>>,
    rr_failures: Mutex<Vec<TemplateLabels>>,
}

impl MockSynthesisMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self) -> Vec<MatchLabels> {
        self.matches.lock().unwrap().clone()
    }

    pub fn render_failures(&self) -> Vec<TemplateLabels> {
        self.render_failures.lock().unwrap().clone()
    }

    pub fn rr_failures(&self) -> Vec<TemplateLabels> {
        self.rr_failures.lock().unwrap().clone()
    }
}

impl SynthesisMetrics for MockSynthesisMetrics {
    fn record_match(&self, labels: &MatchLabels) {
        self.matches.lock().unwrap().push(labels.clone());
    }

    fn record_render_failure(&self, labels: &TemplateLabels) {
        self.render_failures.lock().unwrap().push(labels.clone());
    }

    fn record_rr_failure(&self, labels: &TemplateLabels) {
        self.rr_failures.lock().unwrap().push(labels.clone());
    }
}

pub struct MockUpstreamResolver {
    reply: Mutex<Option<Result<Message, DomainError>>>,
    calls: AtomicUsize,
}

impl MockUpstreamResolver {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: Message) {
        *self.reply.lock().unwrap() = Some(Ok(reply));
    }

    pub fn set_error(&self, error: DomainError) {
        *self.reply.lock().unwrap() = Some(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockUpstreamResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstreamResolver {
    async fn resolve(
        &self,
        _target: &UpstreamAddr,
        _query: &Message,
        cancel: &CancellationToken,
    ) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Err(DomainError::UpstreamDeadline("unset".to_string())))
    }
}
