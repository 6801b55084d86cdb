//! Recording push transport for testing.

use crate::application::ports::{PushError, PushTransport};
use crate::domain::notification::PushPayload;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Push transport that records every send instead of delivering it.
///
/// Can be scripted to fail the next N sends to exercise the best-effort
/// push path.
#[derive(Debug, Default)]
pub struct RecordingPushTransport {
    token_sends: Mutex<Vec<(String, PushPayload)>>,
    topic_sends: Mutex<Vec<(String, PushPayload)>>,
    failures_remaining: AtomicU32,
}

impl RecordingPushTransport {
    /// Create a transport that accepts every send.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` sends (token or topic) fail.
    pub fn fail_next_sends(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Every token send accepted so far.
    pub fn token_sends(&self) -> Vec<(String, PushPayload)> {
        self.token_sends
            .lock()
            .expect("RecordingPushTransport mutex poisoned")
            .clone()
    }

    /// Every topic send accepted so far.
    pub fn topic_sends(&self) -> Vec<(String, PushPayload)> {
        self.topic_sends
            .lock()
            .expect("RecordingPushTransport mutex poisoned")
            .clone()
    }

    fn should_fail(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl PushTransport for RecordingPushTransport {
    async fn send_to_token(&self, token: &str, payload: &PushPayload) -> Result<(), PushError> {
        if self.should_fail() {
            return Err(PushError::Transport("scripted failure".into()));
        }
        self.token_sends
            .lock()
            .expect("RecordingPushTransport mutex poisoned")
            .push((token.to_string(), payload.clone()));
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, payload: &PushPayload) -> Result<(), PushError> {
        if self.should_fail() {
            return Err(PushError::Transport("scripted failure".into()));
        }
        self.topic_sends
            .lock()
            .expect("RecordingPushTransport mutex poisoned")
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}
