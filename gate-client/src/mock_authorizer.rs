use crate::error::AuthorizeError;
use crate::verdict::Verdict;
use crate::Authorizer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted authorizer for tests.
///
/// Responses are queued ahead of time and handed out in order; an exhausted
/// queue reports a distinctive error so a test that over-calls fails loudly.
#[derive(Clone, Debug, Default)]
pub struct MockAuthorizer {
    responses: Arc<Mutex<VecDeque<Result<Verdict, AuthorizeError>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a positive or negative verdict
    pub fn with_verdict(self, verdict: Verdict) -> Self {
        self.responses
            .lock()
            .expect("mock queue poisoned")
            .push_back(Ok(verdict));
        self
    }

    /// Queue a client-side failure
    pub fn with_error(self, error: AuthorizeError) -> Self {
        self.responses
            .lock()
            .expect("mock queue poisoned")
            .push_back(Err(error));
        self
    }

    /// Number of authorize calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    async fn authorize(
        &self,
        _app_id: &str,
        _app_key: Option<&str>,
        _referrer: Option<&str>,
    ) -> Result<Verdict, AuthorizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .expect("mock queue poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(AuthorizeError::Response {
                    status: 500,
                    code: "mock_exhausted".to_string(),
                    message: "no scripted response left in MockAuthorizer".to_string(),
                })
            })
    }
}
