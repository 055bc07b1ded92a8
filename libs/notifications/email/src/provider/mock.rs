//! In-memory provider for tests

use super::{EmailProvider, SendResult};
use crate::models::Email;
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

/// Records every delivered email. Clones share the same mailbox.
#[derive(Clone, Default)]
pub struct MockSmtpProvider {
    sent_emails: Arc<Mutex<Vec<Email>>>,
    attempts: Arc<AtomicU32>,
    /// Sends left to fail; `u32::MAX` fails forever
    failures_left: Arc<AtomicU32>,
}

impl MockSmtpProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails.
    pub fn failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    /// The first `times` sends fail, later ones succeed.
    pub fn failing_times(times: u32) -> Self {
        let provider = Self::default();
        provider.failures_left.store(times, Ordering::SeqCst);
        provider
    }

    pub async fn sent_emails(&self) -> Vec<Email> {
        self.sent_emails.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent_emails.lock().await.len()
    }

    pub async fn sent_to(&self, address: &str) -> Vec<Email> {
        self.sent_emails
            .lock()
            .await
            .iter()
            .filter(|e| e.to == address)
            .cloned()
            .collect()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        !self.sent_to(address).await.is_empty()
    }

    /// Successful and failed send calls.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn clear(&self) {
        self.sent_emails.lock().await.clear();
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl EmailProvider for MockSmtpProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(eyre::eyre!("Mock SMTP failure"));
        }

        self.sent_emails.lock().await.push(email.clone());

        Ok(SendResult {
            message_id: format!("mock-{}", email.id),
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
