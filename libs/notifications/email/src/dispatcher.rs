//! In-process email queue.
//!
//! [`EmailDispatcher::enqueue`] never waits on the mail server. A single
//! worker task owns the provider and sends messages in arrival order. A
//! failed send is retried with exponential backoff until the message's
//! retry budget runs out, then the failure is logged and the message is
//! dropped.

use crate::error::{NotificationError, NotificationResult};
use crate::models::Email;
use crate::provider::EmailProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Delay before the first retry
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2,
        }
    }
}

impl DispatcherConfig {
    /// Retries without sleeping. Used by tests.
    pub fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

enum Command {
    Send(Box<Email>),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle to the email worker
#[derive(Clone)]
pub struct EmailDispatcher {
    sender: mpsc::UnboundedSender<Command>,
}

impl EmailDispatcher {
    /// Start the worker on the current Tokio runtime.
    ///
    /// The worker stops once every handle has been dropped and the queue
    /// is drained.
    pub fn spawn(provider: Arc<dyn EmailProvider>, config: DispatcherConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(provider, config, receiver));
        Self { sender }
    }

    pub fn enqueue(&self, email: Email) -> NotificationResult<()> {
        debug!(email_id = %email.id, to = %email.to, "Queueing email");
        self.sender
            .send(Command::Send(Box::new(email)))
            .map_err(|_| NotificationError::QueueClosed)
    }

    /// Wait until every email queued before this call has been sent or
    /// given up on.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Command::Flush(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

async fn run_worker(
    provider: Arc<dyn EmailProvider>,
    config: DispatcherConfig,
    mut receiver: mpsc::UnboundedReceiver<Command>,
) {
    info!(provider = provider.name(), "Email dispatcher started");

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Send(email) => deliver(provider.as_ref(), &config, *email).await,
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    info!("Email dispatcher stopped");
}

async fn deliver(provider: &dyn EmailProvider, config: &DispatcherConfig, mut email: Email) {
    loop {
        match provider.send(&email).await {
            Ok(result) => {
                info!(
                    email_id = %email.id,
                    to = %email.to,
                    template = email.template.as_deref().unwrap_or("none"),
                    message_id = %result.message_id,
                    attempts = email.retry_count + 1,
                    "Email sent"
                );
                return;
            }
            Err(e) if email.can_retry() => {
                email.increment_retry();
                let delay = config.backoff(email.retry_count);
                warn!(
                    email_id = %email.id,
                    to = %email.to,
                    retry = email.retry_count,
                    max_retries = email.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Email send failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(
                    email_id = %email.id,
                    to = %email.to,
                    template = email.template.as_deref().unwrap_or("none"),
                    attempts = email.retry_count + 1,
                    error = %e,
                    "Email permanently failed"
                );
                return;
            }
        }
    }
}
