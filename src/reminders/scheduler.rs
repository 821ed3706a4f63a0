use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime, Time};
use tracing::{error, info, instrument, warn};

use crate::reminders::notifier::Notifier;
use crate::state::AppState;
use crate::store::Store;

pub(crate) fn is_email(username: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(username)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub checked: usize,
    pub sent: usize,
    pub failed: usize,
}

/// One pass over all users: anyone with an email-shaped username whose most
/// recent upload is older than `after_days` (or who has never uploaded) gets
/// one reminder. Read-only apart from the mail side effect; a failed send is
/// logged and the batch continues.
#[instrument(skip(store, notifier, now))]
pub async fn run_sweep(
    store: &dyn Store,
    notifier: &dyn Notifier,
    now: OffsetDateTime,
    after_days: i64,
) -> SweepStats {
    let mut stats = SweepStats::default();
    for user in store.list_users().await {
        if !is_email(&user.username) {
            continue;
        }
        stats.checked += 1;

        let last_upload = store
            .find_uploads_by_user(user.id)
            .await
            .into_iter()
            .map(|r| r.uploaded_at)
            .max();
        let days_overdue = match last_upload {
            Some(at) => {
                let days = (now - at).whole_days();
                if days <= after_days {
                    continue;
                }
                Some(days)
            }
            // Never uploaded: infinitely overdue.
            None => None,
        };

        match notifier.send_reminder(&user.username, days_overdue).await {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                error!(error = %e, username = %user.username, "reminder send failed");
                stats.failed += 1;
            }
        }
    }
    info!(
        checked = stats.checked,
        sent = stats.sent,
        failed = stats.failed,
        "reminder sweep finished"
    );
    stats
}

/// Next occurrence of `hour_utc:00` strictly after `now`.
fn next_run_after(now: OffsetDateTime, hour_utc: u8) -> OffsetDateTime {
    let today_run = now.replace_time(Time::from_hms(hour_utc, 0, 0).expect("hour < 24"));
    if today_run > now {
        today_run
    } else {
        today_run + TimeDuration::days(1)
    }
}

/// Background task firing the sweep once per day at the configured UTC hour.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    let hour = state.config.reminders.hour_utc;
    let after_days = state.config.reminders.after_days;
    tokio::spawn(async move {
        loop {
            let now = OffsetDateTime::now_utc();
            let next = next_run_after(now, hour);
            let wait = next - now;
            match wait.try_into() {
                Ok(wait) => tokio::time::sleep(wait).await,
                Err(_) => {
                    warn!("scheduler clock went backwards; retrying in an hour");
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    continue;
                }
            }
            run_sweep(
                state.store.as_ref(),
                state.notifier.as_ref(),
                OffsetDateTime::now_utc(),
                after_days,
            )
            .await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::user::User;
    use crate::store::MemoryStore;
    use crate::uploads::record::UploadRecord;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::macros::datetime;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_reminder(&self, to: &str, _days: Option<i64>) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(anyhow!("mailbox unavailable"));
            }
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    const NOW: OffsetDateTime = datetime!(2026-08-29 12:00:00 UTC);

    async fn seed_user(store: &MemoryStore, username: &str, uploaded_days_ago: Option<i64>) {
        let user = User::new(username, "hash", "oily");
        store.append_user(user.clone()).await.expect("append user");
        if let Some(days) = uploaded_days_ago {
            let mut record = UploadRecord::new(user.id, "1.jpg", "oily");
            record.uploaded_at = NOW - TimeDuration::days(days);
            store.append_upload(record).await;
        }
    }

    #[tokio::test]
    async fn reminds_only_users_past_the_threshold() {
        let store = MemoryStore::new();
        seed_user(&store, "overdue@x.com", Some(31)).await;
        seed_user(&store, "recent@x.com", Some(29)).await;
        seed_user(&store, "never@x.com", None).await;

        let notifier = RecordingNotifier::default();
        let stats = run_sweep(&store, &notifier, NOW, 30).await;

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent.contains(&"overdue@x.com".to_string()));
        assert!(sent.contains(&"never@x.com".to_string()));
        assert_eq!(stats, SweepStats { checked: 3, sent: 2, failed: 0 });
    }

    #[tokio::test]
    async fn skips_usernames_that_are_not_emails() {
        let store = MemoryStore::new();
        seed_user(&store, "not-an-email", None).await;

        let notifier = RecordingNotifier::default();
        let stats = run_sweep(&store, &notifier, NOW, 30).await;
        assert_eq!(stats, SweepStats::default());
    }

    #[tokio::test]
    async fn one_failed_send_does_not_stop_the_batch() {
        let store = MemoryStore::new();
        seed_user(&store, "bad@x.com", None).await;
        seed_user(&store, "good@x.com", None).await;

        let notifier = RecordingNotifier {
            fail_for: Some("bad@x.com".into()),
            ..Default::default()
        };
        let stats = run_sweep(&store, &notifier, NOW, 30).await;

        assert_eq!(stats.sent, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["good@x.com".to_string()]);
    }

    #[test]
    fn email_regex_accepts_addresses_and_rejects_noise() {
        assert!(is_email("a@x.com"));
        assert!(is_email("first.last@sub.domain.org"));
        assert!(!is_email("plainname"));
        assert!(!is_email("a b@x.com"));
        assert!(!is_email("a@nodot"));
    }

    #[test]
    fn next_run_is_today_before_the_hour_and_tomorrow_after() {
        let before = datetime!(2026-08-29 06:00:00 UTC);
        assert_eq!(next_run_after(before, 8), datetime!(2026-08-29 08:00:00 UTC));

        let after = datetime!(2026-08-29 09:00:00 UTC);
        assert_eq!(next_run_after(after, 8), datetime!(2026-08-30 08:00:00 UTC));
    }
}
