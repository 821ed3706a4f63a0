use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

/// Outbound boundary for reminder mail. Send failures come back as results,
/// never as panics crossing the scheduler.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, to: &str, days_overdue: Option<i64>) -> anyhow::Result<()>;
}

/// Mailgun messages API over HTTP.
pub struct MailgunNotifier {
    http: reqwest::Client,
    api_key: String,
    domain: String,
    from: String,
}

impl MailgunNotifier {
    pub fn new(api_key: &str, domain: &str, from: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            domain: domain.to_string(),
            from: from.to_string(),
        })
    }

    fn body_for(days_overdue: Option<i64>) -> String {
        match days_overdue {
            Some(days) => format!(
                "It has been {days} days since your last skin photo. \
                 Upload a new one to keep your analysis history current."
            ),
            None => "You haven't uploaded a skin photo yet. \
                     Upload one to get your first analysis."
                .to_string(),
        }
    }
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn send_reminder(&self, to: &str, days_overdue: Option<i64>) -> anyhow::Result<()> {
        let text = Self::body_for(days_overdue);
        let params = [
            ("from", self.from.as_str()),
            ("to", to),
            ("subject", "Time for a new skin check-in"),
            ("text", text.as_str()),
        ];
        self.http
            .post(format!(
                "https://api.mailgun.net/v3/{}/messages",
                self.domain
            ))
            .basic_auth("api", Some(&self.api_key))
            .form(&params)
            .send()
            .await
            .context("send reminder mail")?
            .error_for_status()
            .context("mail provider rejected message")?;
        info!(to = %to, "reminder mail sent");
        Ok(())
    }
}

/// Discards mail; used when MAIL_MODE=off.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_reminder(&self, to: &str, _days_overdue: Option<i64>) -> anyhow::Result<()> {
        debug!(to = %to, "mail disabled; reminder dropped");
        Ok(())
    }
}
