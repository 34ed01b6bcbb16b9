use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

const NOTIFY_ATTEMPTS: u32 = 3;
const NOTIFY_PAUSE: Duration = Duration::from_secs(1);

/// Channel back to the requester. The chat protocol itself lives outside this
/// service; the coordinator only needs these two calls.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), String>;
    async fn send_document(&self, user_id: i64, path: &Path, caption: &str) -> Result<(), String>;
}

/// Bounded-retry wrapper around [`Notifier::send_message`]. Failures are
/// logged here and swallowed: losing a notification must never abort an
/// already-committed state transition.
pub async fn notify_message(notifier: &dyn Notifier, user_id: i64, text: &str) {
    for attempt in 1..=NOTIFY_ATTEMPTS {
        match notifier.send_message(user_id, text).await {
            Ok(()) => return,
            Err(e) => {
                eprintln!(
                    "Notify | message to {} failed (attempt {}/{}): {}",
                    user_id, attempt, NOTIFY_ATTEMPTS, e
                );
                if attempt < NOTIFY_ATTEMPTS {
                    tokio::time::sleep(NOTIFY_PAUSE).await;
                }
            }
        }
    }
}

/// Same policy as [`notify_message`], for artifact delivery. Returns whether
/// the document went out so the caller can record a delivery failure.
pub async fn notify_document(
    notifier: &dyn Notifier,
    user_id: i64,
    path: &Path,
    caption: &str,
) -> bool {
    for attempt in 1..=NOTIFY_ATTEMPTS {
        match notifier.send_document(user_id, path, caption).await {
            Ok(()) => return true,
            Err(e) => {
                eprintln!(
                    "Notify | document to {} failed (attempt {}/{}): {}",
                    user_id, attempt, NOTIFY_ATTEMPTS, e
                );
                if attempt < NOTIFY_ATTEMPTS {
                    tokio::time::sleep(NOTIFY_PAUSE).await;
                }
            }
        }
    }
    false
}

/// Stdout-only channel used by the service binary; real chat delivery plugs in
/// behind the same trait.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), String> {
        println!("Notify | user={} | {}", user_id, text);
        Ok(())
    }

    async fn send_document(&self, user_id: i64, path: &Path, caption: &str) -> Result<(), String> {
        println!("Notify | user={} | document {} | {}", user_id, path.display(), caption);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct AlwaysDown {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Notifier for AlwaysDown {
        async fn send_message(&self, _user_id: i64, _text: &str) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("network unreachable".to_string())
        }

        async fn send_document(&self, _user_id: i64, _path: &Path, _caption: &str) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("network unreachable".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn message_retries_are_bounded_and_failures_swallowed() {
        let channel = AlwaysDown::default();
        notify_message(&channel, 42, "hello").await;
        assert_eq!(channel.calls.load(Ordering::SeqCst), NOTIFY_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn document_delivery_reports_final_failure() {
        let channel = AlwaysDown::default();
        let delivered = notify_document(&channel, 42, Path::new("r.txt"), "result").await;
        assert!(!delivered);
        assert_eq!(channel.calls.load(Ordering::SeqCst), NOTIFY_ATTEMPTS);
    }
}
