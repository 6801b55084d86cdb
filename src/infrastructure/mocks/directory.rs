//! Scripted user directory for testing.

use crate::application::ports::{DirectoryError, NotificationEligibility, UserDirectory};
use async_trait::async_trait;
use dashmap::DashMap;

/// User directory backed by a static map.
///
/// Unknown users default to eligible with a token derived from their id
/// (`token-<user_id>`), so tests only need to script the exceptions.
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    users: DashMap<String, NotificationEligibility>,
    unavailable: std::sync::atomic::AtomicBool,
}

impl StaticUserDirectory {
    /// Create a directory where every user is eligible by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a specific user's eligibility.
    pub fn set_user(&self, user_id: &str, eligibility: NotificationEligibility) {
        self.users.insert(user_id.to_string(), eligibility);
    }

    /// Make every lookup fail, simulating a directory outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn notification_eligibility(
        &self,
        user_id: &str,
    ) -> Result<NotificationEligibility, DirectoryError> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("scripted outage".into()));
        }
        Ok(self
            .users
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| NotificationEligibility {
                should_notify: true,
                push_token: Some(format!("token-{user_id}")),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_user_is_eligible() {
        let directory = StaticUserDirectory::new();
        let eligibility = directory.notification_eligibility("alice").await.unwrap();

        assert!(eligibility.should_notify);
        assert_eq!(eligibility.push_token.as_deref(), Some("token-alice"));
    }

    #[tokio::test]
    async fn test_scripted_user_overrides_default() {
        let directory = StaticUserDirectory::new();
        directory.set_user(
            "alice",
            NotificationEligibility {
                should_notify: false,
                push_token: None,
            },
        );

        let eligibility = directory.notification_eligibility("alice").await.unwrap();
        assert!(!eligibility.should_notify);
        assert!(eligibility.push_token.is_none());
    }

    #[tokio::test]
    async fn test_outage() {
        let directory = StaticUserDirectory::new();
        directory.set_unavailable(true);

        assert!(directory.notification_eligibility("alice").await.is_err());
    }
}
