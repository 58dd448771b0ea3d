//! Outbound notification queue and delivery worker.
//!
//! Handlers never send mail inline: the auth flow pushes an
//! [`EmailMessage`] onto an in-process queue and a background task hands
//! each message to an [`EmailSender`]. Failed sends are retried with
//! exponential backoff and jitter up to a max attempt count, then dropped
//! with an error log. The queue is in-memory, never a database table:
//! reset OTPs travel through it in plaintext and must not be persisted.
//!
//! The default sender for local dev is [`LogEmailSender`], which logs and
//! returns `Ok(())`; real delivery is an external collaborator behind the
//! same trait.

use anyhow::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info};

/// A message handed to the notification channel.
#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email delivery abstraction used by the queue worker.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to trigger a retry.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
/// The body is not logged; it may contain a reset OTP.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(to = %message.to, subject = %message.subject, "email send stub");
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MailerConfig {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl MailerConfig {
    /// Default worker config: 5 attempts with 1s->60s exponential backoff
    /// and jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    #[must_use]
    pub fn with_backoff_max(mut self, backoff_max: Duration) -> Self {
        self.backoff_max = backoff_max;
        self
    }

    #[must_use]
    pub fn normalize(self) -> Self {
        let max_attempts = self.max_attempts.max(1);
        let backoff_base = if self.backoff_base.is_zero() {
            Duration::from_millis(1)
        } else {
            self.backoff_base
        };
        let backoff_max = if self.backoff_max < backoff_base {
            backoff_base
        } else {
            self.backoff_max
        };
        Self {
            max_attempts,
            backoff_base,
            backoff_max,
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap cloneable handle to the outbound queue.
#[derive(Clone, Debug)]
pub struct Mailer {
    tx: mpsc::UnboundedSender<EmailMessage>,
}

impl Mailer {
    /// Spawn the delivery worker and return a handle to its queue.
    #[must_use]
    pub fn spawn(sender: Arc<dyn EmailSender>, config: MailerConfig) -> Self {
        let (mailer, rx) = Self::channel();
        tokio::spawn(deliver_loop(rx, sender, config.normalize()));
        mailer
    }

    /// Queue without a worker; the caller owns the receiving end. Lets
    /// tests observe exactly what the flow would have sent.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmailMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a message. Delivery is best-effort: a closed queue is
    /// logged, never propagated to the request that produced the message.
    pub fn deliver(&self, message: EmailMessage) {
        if self.tx.send(message).is_err() {
            error!("email queue is closed; dropping outbound message");
        }
    }
}

async fn deliver_loop(
    mut rx: mpsc::UnboundedReceiver<EmailMessage>,
    sender: Arc<dyn EmailSender>,
    config: MailerConfig,
) {
    while let Some(message) = rx.recv().await {
        deliver_with_retry(sender.as_ref(), &message, &config).await;
    }
}

async fn deliver_with_retry(sender: &dyn EmailSender, message: &EmailMessage, config: &MailerConfig) {
    for attempt in 1..=config.max_attempts {
        match sender.send(message) {
            Ok(()) => return,
            Err(err) if attempt == config.max_attempts => {
                error!(
                    to = %message.to,
                    subject = %message.subject,
                    attempts = attempt,
                    "giving up on email delivery: {err}"
                );
            }
            Err(err) => {
                let delay = backoff_delay(attempt, config.backoff_base, config.backoff_max);
                error!(
                    to = %message.to,
                    attempt,
                    "email delivery failed, retrying in {delay:?}: {err}"
                );
                sleep(delay).await;
            }
        }
    }
}

fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let factor = 1u32 << shift;
    let delay = base.checked_mul(factor).unwrap_or(max);
    let capped = if delay > max { max } else { delay };
    jitter_delay(capped)
}

fn jitter_delay(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    if delay_ms < 2 {
        return delay;
    }
    let half = delay_ms / 2;
    let jitter = rand::thread_rng().gen_range(0..=half);
    Duration::from_millis(half + jitter)
}
