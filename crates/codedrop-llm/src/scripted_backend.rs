//! Backend that answers from a script instead of the network
//!
//! Used by tests and by `codedrop replay` to push a saved response through
//! the full pipeline offline.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use codedrop_utils::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

const PROVIDER: &str = "scripted";

/// Queue of canned replies, consumed in order
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers once with `reply`.
    #[must_use]
    pub fn with_reply(reply: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.push_reply(reply);
        backend
    }

    /// Backend whose first call fails with `error`.
    #[must_use]
    pub fn with_error(error: LlmError) -> Self {
        let backend = Self::new();
        backend.push_error(error);
        backend
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_replies().push_back(Err(error));
    }

    /// Every invocation received so far, oldest first.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        match self.invocations.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        self.invocations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(inv);

        let next = self.lock_replies().pop_front();
        match next {
            Some(Ok(reply)) if reply.is_empty() => Err(LlmError::EmptyResponse),
            Some(Ok(reply)) => Ok(LlmResult::new(reply, PROVIDER, model)),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::Transport("no scripted reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn inv(user: &str) -> LlmInvocation {
        LlmInvocation::chat("m", Duration::from_secs(1), "sys", user)
    }

    #[tokio::test]
    async fn test_replies_in_order_then_runs_dry() {
        let backend = ScriptedBackend::with_reply("first");
        backend.push_reply("second");

        assert_eq!(backend.invoke(inv("a")).await.unwrap().raw_response, "first");
        assert_eq!(backend.invoke(inv("b")).await.unwrap().raw_response, "second");
        assert!(matches!(
            backend.invoke(inv("c")).await,
            Err(LlmError::Transport(_))
        ));

        let seen = backend.invocations();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].user_message(), Some("b"));
    }

    #[tokio::test]
    async fn test_scripted_error_and_empty_reply() {
        let backend = ScriptedBackend::with_error(LlmError::Timeout {
            duration: Duration::from_secs(3),
        });
        backend.push_reply("");

        assert!(matches!(
            backend.invoke(inv("x")).await,
            Err(LlmError::Timeout { .. })
        ));
        assert_eq!(
            backend.invoke(inv("y")).await.unwrap_err(),
            LlmError::EmptyResponse
        );
    }
}
