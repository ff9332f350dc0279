use std::{sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{domain::ChatId, messaging::port::MessagingPort};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends a batch of notifications one message at a time.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn MessagingPort>,
    send_delay: Duration,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn MessagingPort>, send_delay: Duration) -> Self {
        Self {
            messenger,
            send_delay,
        }
    }

    /// Each message is one unit: text over the messenger's limit goes out as
    /// consecutive parts. A rejected message is logged and skipped; the rest
    /// of the batch still goes out.
    pub async fn dispatch(&self, destination: ChatId, messages: &[String]) -> DispatchReport {
        let max_len = self.messenger.capabilities().max_message_len;
        let mut report = DispatchReport::default();

        for (idx, message) in messages.iter().enumerate() {
            if idx > 0 && !self.send_delay.is_zero() {
                sleep(self.send_delay).await;
            }

            let mut delivered = true;
            for (part, chunk) in split_message(message, max_len).into_iter().enumerate() {
                if part > 0 && !self.send_delay.is_zero() {
                    sleep(self.send_delay).await;
                }
                if let Err(e) = self.messenger.send_text(destination, chunk).await {
                    delivered = false;
                    tracing::error!(chat_id = destination.0, index = idx, part, error = %e, "failed to send notification");
                    break;
                }
            }
            if delivered {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.failed > 0 {
            tracing::warn!(
                chat_id = destination.0,
                sent = report.sent,
                failed = report.failed,
                "batch delivered with failures"
            );
        }
        report
    }
}

/// Split `s` into pieces of at most `max` characters, breaking after the last
/// newline that fits when there is one.
fn split_message(s: &str, max: usize) -> Vec<&str> {
    let max = max.max(1);
    let mut out = Vec::new();
    let mut rest = s;
    loop {
        let Some((cut, _)) = rest.char_indices().nth(max) else {
            out.push(rest);
            return out;
        };
        let end = match rest[..cut].rfind('\n') {
            Some(nl) if nl > 0 => nl + 1,
            _ => cut,
        };
        out.push(&rest[..end]);
        rest = &rest[end..];
    }
}
