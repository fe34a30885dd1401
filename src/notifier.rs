use std::sync::mpsc;
use std::thread;

/// Recalculation trigger for the external tax-profile service: the account
/// plus the distinct calendar years touched by newly persisted transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalculationRequest {
    pub account_id: i64,
    pub years: Vec<i32>,
}

/// Boundary to the tax-profile collaborator. Implementations may call out
/// over the network; errors are logged by the worker and never surface to
/// ingestion callers.
pub trait RecalculationSink: Send + 'static {
    fn recalculate(&self, account_id: i64, years: &[i32]) -> anyhow::Result<()>;
}

/// Default sink when no tax-profile service is wired up.
pub struct LoggingSink;

impl RecalculationSink for LoggingSink {
    fn recalculate(&self, account_id: i64, years: &[i32]) -> anyhow::Result<()> {
        log::info!("recalculation requested for account {account_id}, years {years:?}");
        Ok(())
    }
}

/// Outbound queue feeding a background worker thread. `notify` hands the
/// request off without waiting on the sink, so a slow or failing collaborator
/// cannot delay an ingestion result or roll back a completed document.
pub struct Notifier {
    tx: Option<mpsc::Sender<RecalculationRequest>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Notifier {
    pub fn spawn<S: RecalculationSink>(sink: S) -> Self {
        let (tx, rx) = mpsc::channel::<RecalculationRequest>();
        let handle = thread::spawn(move || {
            for req in rx {
                if let Err(e) = sink.recalculate(req.account_id, &req.years) {
                    log::warn!(
                        "tax-profile recalculation failed for account {}: {e}",
                        req.account_id
                    );
                }
            }
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// A notifier that drops every request. For callers with no downstream
    /// service and for tests that only exercise ingestion.
    pub fn noop() -> Self {
        Self { tx: None, handle: None }
    }

    pub fn notify(&self, account_id: i64, years: Vec<i32>) {
        let Some(tx) = &self.tx else { return };
        if tx.send(RecalculationRequest { account_id, years }).is_err() {
            log::warn!("recalculation worker gone; dropping request for account {account_id}");
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Close the channel, then drain: requests already handed off are
        // still delivered before shutdown.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct CollectingSink(Arc<Mutex<Vec<RecalculationRequest>>>);

    impl RecalculationSink for CollectingSink {
        fn recalculate(&self, account_id: i64, years: &[i32]) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(RecalculationRequest {
                account_id,
                years: years.to_vec(),
            });
            Ok(())
        }
    }

    struct FailingSink;

    impl RecalculationSink for FailingSink {
        fn recalculate(&self, _account_id: i64, _years: &[i32]) -> anyhow::Result<()> {
            anyhow::bail!("service unavailable")
        }
    }

    #[test]
    fn test_requests_reach_the_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::spawn(CollectingSink(seen.clone()));
        notifier.notify(1, vec![2024, 2025]);
        notifier.notify(2, vec![2025]);
        drop(notifier); // drains the queue

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], RecalculationRequest { account_id: 1, years: vec![2024, 2025] });
    }

    #[test]
    fn test_sink_failure_does_not_panic_or_block() {
        let notifier = Notifier::spawn(FailingSink);
        notifier.notify(1, vec![2025]);
        drop(notifier);
    }

    #[test]
    fn test_noop_notifier() {
        let notifier = Notifier::noop();
        notifier.notify(1, vec![2025]);
    }
}
