// Change Notifier - detects newly-active and soon-due boxes and announces
// each at most once.
//
// Dedup is keyed on `name|location` for new boxes and `name|location|reminder`
// for deadline reminders. Each job is delivered first and its key recorded
// durably right after: a crash between the two re-sends that one job on the
// next cycle, it never drops a decided notification and never replays
// history.

use std::sync::Arc;

use chrono::{Duration, FixedOffset, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::deadline::{self, DeadlineClass};
use crate::error::AppResult;
use crate::notify::jobs::NotificationJob;
use crate::notify::notifier::Notifier;
use crate::registry::reader::RegistryReader;
use crate::store::{NotifiedStore, SubscriberStore};

pub struct ChangeNotifier {
    reader: Arc<RegistryReader>,
    notified: Arc<dyn NotifiedStore>,
    subscribers: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    tz: FixedOffset,
    tz_label: String,
    reminder_window: Duration,
    /// Single-flight guard: two overlapping polls racing on the same key
    /// could double-notify, so only one cycle runs at a time.
    poll_gate: Mutex<()>,
}

impl ChangeNotifier {
    pub fn new(
        reader: Arc<RegistryReader>,
        notified: Arc<dyn NotifiedStore>,
        subscribers: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
        tz: FixedOffset,
        tz_label: String,
        reminder_window: Duration,
    ) -> Self {
        Self {
            reader,
            notified,
            subscribers,
            notifier,
            tz,
            tz_label,
            reminder_window,
            poll_gate: Mutex::new(()),
        }
    }

    /// One poll cycle: compute the delta against the notified set and, per
    /// job, dispatch to every subscriber and then record the key durably.
    /// Recording after dispatch means a failure in between re-sends that one
    /// job next cycle instead of silently swallowing it; the cycle gate keeps
    /// the two from racing in-process. A registry or subscriber-directory
    /// fetch failure aborts the cycle before anything is sent or recorded.
    /// Returns the jobs dispatched this cycle; an overlapping cycle yields
    /// none.
    pub async fn poll_once(&self) -> AppResult<Vec<NotificationJob>> {
        let _gate = match self.poll_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                debug!("Poll already in flight, skipping this tick");
                return Ok(Vec::new());
            }
        };

        let entries = self.reader.list_active_boxes().await?;
        let recipients = self.subscribers.all().await?;
        let now = Utc::now().with_timezone(&self.tz);
        let mut jobs = Vec::new();

        for entry in &entries {
            let key = entry.key();
            if !self.notified.contains(&key).await? {
                info!("🔔 New box observed: {}", entry.name);
                let job = NotificationJob::new_box(entry);
                self.deliver(&job, &recipients).await;
                self.notified.add(&key).await?;
                jobs.push(job);
            }

            // Boxes without deadline text never reach the evaluator
            let Some(text) = &entry.deadline_text else {
                continue;
            };
            let Some(instant) = deadline::parse(text, self.tz, &self.tz_label) else {
                debug!("Unparseable deadline for '{}': {:?}", entry.name, text);
                continue;
            };
            if deadline::classify(instant, now, self.reminder_window) != DeadlineClass::DueSoon {
                continue;
            }

            let reminder_key = entry.reminder_key();
            if !self.notified.contains(&reminder_key).await? {
                info!("🔔 Deadline approaching for: {}", entry.name);
                let job = NotificationJob::deadline_reminder(entry);
                self.deliver(&job, &recipients).await;
                self.notified.add(&reminder_key).await?;
                jobs.push(job);
            }
        }

        Ok(jobs)
    }

    /// Fan one job out to every subscriber. Fire-and-forget per recipient:
    /// one unreachable chat must not block the rest of the batch.
    async fn deliver(&self, job: &NotificationJob, recipients: &[String]) {
        let text = job.message_text();
        for recipient in recipients {
            if let Err(e) = self.notifier.send(recipient, &text).await {
                warn!("Failed to notify {}: {}", recipient, e);
            }
        }
    }

    /// The unit the scheduler drives.
    pub async fn run_cycle(&self) -> AppResult<usize> {
        Ok(self.poll_once().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Datelike;
    use parking_lot::RwLock;

    use crate::error::{AppError, SourceError};
    use crate::notify::jobs::NotificationKind;
    use crate::notify::notifier::LogNotifier;
    use crate::registry::models::{
        COL_ACTIVE, COL_BOX_NAME, COL_PAYMENT_DEADLINE, COL_SHEET_REFERENCE,
    };
    use crate::sources::{RawRow, RegistrySource};
    use crate::store::memory::{InMemoryNotifiedStore, InMemorySubscriberStore};

    struct FakeRegistry {
        rows: RwLock<Vec<RawRow>>,
        fail: RwLock<bool>,
    }

    impl FakeRegistry {
        fn new(rows: Vec<RawRow>) -> Arc<Self> {
            Arc::new(Self {
                rows: RwLock::new(rows),
                fail: RwLock::new(false),
            })
        }
    }

    #[async_trait]
    impl RegistrySource for FakeRegistry {
        async fn list_all(&self) -> Result<Vec<RawRow>, SourceError> {
            if *self.fail.read() {
                return Err(SourceError::Unavailable("registry down".to_string()));
            }
            Ok(self.rows.read().clone())
        }
    }

    struct RecordingNotifier {
        sent: RwLock<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, recipient: &str, text: &str) -> AppResult<()> {
            if self.fail_for.as_deref() == Some(recipient) {
                return Err(AppError::Notifier("unreachable".to_string()));
            }
            self.sent
                .write()
                .push((recipient.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn box_row(name: &str, location: &str, deadline: &str) -> RawRow {
        RawRow::from_pairs(&[
            (COL_ACTIVE, "TRUE"),
            (COL_BOX_NAME, name),
            (COL_SHEET_REFERENCE, location),
            (COL_PAYMENT_DEADLINE, deadline),
        ])
    }

    fn change_notifier(
        registry: Arc<FakeRegistry>,
        notified: Arc<dyn NotifiedStore>,
        subscribers: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ChangeNotifier {
        ChangeNotifier::new(
            Arc::new(RegistryReader::new(registry)),
            notified,
            subscribers,
            notifier,
            FixedOffset::east_opt(3 * 3600).unwrap(),
            "МСК".to_string(),
            Duration::hours(24),
        )
    }

    /// A deadline text 12 hours from now, inside the reminder window.
    fn due_soon_text() -> String {
        let soon = Utc::now().with_timezone(&FixedOffset::east_opt(3 * 3600).unwrap())
            + Duration::hours(12);
        format!(
            "{:02}.{:02}.{:04} {} по МСК",
            soon.day(),
            soon.month(),
            soon.year(),
            soon.format("%H:%M"),
        )
    }

    #[tokio::test]
    async fn test_new_box_notified_exactly_once() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let notified = Arc::new(InMemoryNotifiedStore::new());
        let cn = change_notifier(
            registry.clone(),
            notified.clone(),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );

        let jobs = cn.poll_once().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, NotificationKind::NewBox);

        // Second and third polls see nothing new
        assert!(cn.poll_once().await.unwrap().is_empty());
        assert!(cn.poll_once().await.unwrap().is_empty());

        // A fresh ChangeNotifier over the same store also stays quiet,
        // mimicking a process restart with a durable notified set
        let cn2 = change_notifier(
            registry,
            notified,
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );
        assert!(cn2.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_box_survives_restart_with_sqlite() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let store = Arc::new(
            crate::store::sqlite::SqliteStore::connect("sqlite::memory:")
                .await
                .unwrap(),
        );

        let cn = change_notifier(
            registry.clone(),
            store.clone(),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );
        assert_eq!(cn.poll_once().await.unwrap().len(), 1);
        drop(cn);

        // Same durable set, new poller: nothing re-fires
        let cn2 = change_notifier(
            registry,
            store,
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );
        assert!(cn2.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reminder_has_its_own_dedup_key() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", &due_soon_text())]);
        let cn = change_notifier(
            registry,
            Arc::new(InMemoryNotifiedStore::new()),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );

        // First cycle fires both classes for the same box
        let jobs = cn.poll_once().await.unwrap();
        let kinds: Vec<NotificationKind> = jobs.iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::NewBox, NotificationKind::DeadlineReminder]
        );

        // Neither fires again
        assert!(cn.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_deadline_text_means_no_reminder() {
        let registry = FakeRegistry::new(vec![
            box_row("Drop C", "loc-c", ""),
            box_row("Drop D", "loc-d", "когда-нибудь"),
        ]);
        let cn = change_notifier(
            registry,
            Arc::new(InMemoryNotifiedStore::new()),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );

        let jobs = cn.poll_once().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.kind == NotificationKind::NewBox));
    }

    #[tokio::test]
    async fn test_far_future_deadline_is_not_reminded() {
        let registry =
            FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "01.02.2099 21:00 по МСК")]);
        let cn = change_notifier(
            registry,
            Arc::new(InMemoryNotifiedStore::new()),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );

        let jobs = cn.poll_once().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, NotificationKind::NewBox);
    }

    struct OutageSubscriberStore {
        inner: InMemorySubscriberStore,
        fail: RwLock<bool>,
    }

    #[async_trait]
    impl SubscriberStore for OutageSubscriberStore {
        async fn register(&self, handle: &str) -> AppResult<()> {
            self.inner.register(handle).await
        }

        async fn all(&self) -> AppResult<Vec<String>> {
            if *self.fail.read() {
                return Err(AppError::Internal("directory down".to_string()));
            }
            self.inner.all().await
        }
    }

    /// Notified store whose `add` fails once, as a write outage would.
    struct FlakyNotifiedStore {
        inner: InMemoryNotifiedStore,
        fail_next_add: RwLock<bool>,
    }

    #[async_trait]
    impl NotifiedStore for FlakyNotifiedStore {
        async fn contains(&self, key: &str) -> AppResult<bool> {
            self.inner.contains(key).await
        }

        async fn add(&self, key: &str) -> AppResult<()> {
            if std::mem::take(&mut *self.fail_next_add.write()) {
                return Err(AppError::Internal("store write failed".to_string()));
            }
            self.inner.add(key).await
        }
    }

    #[tokio::test]
    async fn test_subscriber_outage_does_not_lose_a_notification() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let notified = Arc::new(InMemoryNotifiedStore::new());
        let subscribers = Arc::new(OutageSubscriberStore {
            inner: InMemorySubscriberStore::new(),
            fail: RwLock::new(true),
        });
        subscribers.inner.register("chat-1").await.unwrap();

        let recording = Arc::new(RecordingNotifier {
            sent: RwLock::new(Vec::new()),
            fail_for: None,
        });
        let cn = change_notifier(
            registry,
            notified.clone(),
            subscribers.clone(),
            recording.clone(),
        );

        // Directory down: the cycle errors before anything is sent or recorded
        assert!(cn.run_cycle().await.is_err());
        assert!(!notified.contains("Drop 7|loc-7").await.unwrap());
        assert!(recording.sent.read().is_empty());

        // Once it recovers the announcement still goes out
        *subscribers.fail.write() = false;
        assert_eq!(cn.run_cycle().await.unwrap(), 1);
        let sent = recording.sent.read();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Drop 7"));
    }

    #[tokio::test]
    async fn test_record_failure_resends_rather_than_drops() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let notified = Arc::new(FlakyNotifiedStore {
            inner: InMemoryNotifiedStore::new(),
            fail_next_add: RwLock::new(true),
        });
        let subscribers = Arc::new(InMemorySubscriberStore::new());
        subscribers.register("chat-1").await.unwrap();

        let recording = Arc::new(RecordingNotifier {
            sent: RwLock::new(Vec::new()),
            fail_for: None,
        });
        let cn = change_notifier(registry, notified, subscribers, recording.clone());

        // First cycle sends, then fails to record the key
        assert!(cn.run_cycle().await.is_err());
        assert_eq!(recording.sent.read().len(), 1);

        // Next cycle re-sends the same job and records it; a duplicate,
        // never a loss
        assert_eq!(cn.run_cycle().await.unwrap(), 1);
        assert_eq!(recording.sent.read().len(), 2);
        assert_eq!(cn.run_cycle().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_registry_failure_mutates_nothing() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        *registry.fail.write() = true;

        let notified = Arc::new(InMemoryNotifiedStore::new());
        let cn = change_notifier(
            registry.clone(),
            notified.clone(),
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        );

        assert!(cn.poll_once().await.is_err());
        assert!(!notified.contains("Drop 7|loc-7").await.unwrap());

        // Once the registry recovers the notification still fires
        *registry.fail.write() = false;
        assert_eq!(cn.poll_once().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_survives_unreachable_subscriber() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let subscribers = Arc::new(InMemorySubscriberStore::new());
        subscribers.register("chat-dead").await.unwrap();
        subscribers.register("chat-live").await.unwrap();

        let recording = Arc::new(RecordingNotifier {
            sent: RwLock::new(Vec::new()),
            fail_for: Some("chat-dead".to_string()),
        });
        let cn = change_notifier(
            registry,
            Arc::new(InMemoryNotifiedStore::new()),
            subscribers,
            recording.clone(),
        );

        assert_eq!(cn.run_cycle().await.unwrap(), 1);

        let sent = recording.sent.read();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "chat-live");
        assert!(sent[0].1.contains("Drop 7"));
    }

    #[tokio::test]
    async fn test_overlapping_polls_cannot_double_notify() {
        let registry = FakeRegistry::new(vec![box_row("Drop 7", "loc-7", "")]);
        let notified = Arc::new(InMemoryNotifiedStore::new());
        let cn = Arc::new(change_notifier(
            registry,
            notified,
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(LogNotifier),
        ));

        let (a, b) = tokio::join!(cn.poll_once(), cn.poll_once());
        let total = a.unwrap().len() + b.unwrap().len();
        assert_eq!(total, 1);
    }
}
