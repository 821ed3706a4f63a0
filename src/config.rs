use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// How analysis requests are served: a local mock or the real provider API.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Mock,
    Http { api_key: String, base_url: String },
}

/// Outbound mail configuration for the reminder job.
#[derive(Debug, Clone)]
pub enum MailConfig {
    Off,
    Mailgun {
        api_key: String,
        domain: String,
        from: String,
    },
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub hour_utc: u8,
    pub after_days: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_root: PathBuf,
    pub jwt: JwtConfig,
    pub provider: ProviderConfig,
    pub mail: MailConfig,
    pub reminders: ReminderConfig,
}

impl AppConfig {
    /// Loads configuration from the environment. Missing required variables
    /// (signing secret, provider credentials in http mode, mail credentials
    /// unless mail is off) abort startup.
    pub fn from_env() -> anyhow::Result<Self> {
        let upload_root =
            PathBuf::from(std::env::var("UPLOAD_ROOT").unwrap_or_else(|_| "uploads".into()));

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            ttl_minutes: std::env::var("TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };

        let provider_mode = std::env::var("PROVIDER_MODE").unwrap_or_else(|_| "mock".into());
        let provider = match provider_mode.as_str() {
            "mock" => ProviderConfig::Mock,
            "http" => ProviderConfig::Http {
                api_key: std::env::var("PROVIDER_API_KEY")
                    .context("PROVIDER_API_KEY is required when PROVIDER_MODE=http")?,
                base_url: std::env::var("PROVIDER_BASE_URL")
                    .context("PROVIDER_BASE_URL is required when PROVIDER_MODE=http")?,
            },
            other => anyhow::bail!("unknown PROVIDER_MODE `{other}` (expected mock or http)"),
        };

        let mail_mode = std::env::var("MAIL_MODE").unwrap_or_else(|_| "mailgun".into());
        let mail = match mail_mode.as_str() {
            "off" => MailConfig::Off,
            "mailgun" => MailConfig::Mailgun {
                api_key: std::env::var("MAILGUN_API_KEY")
                    .context("MAILGUN_API_KEY is required unless MAIL_MODE=off")?,
                domain: std::env::var("MAILGUN_DOMAIN")
                    .context("MAILGUN_DOMAIN is required unless MAIL_MODE=off")?,
                from: std::env::var("MAIL_FROM")
                    .context("MAIL_FROM is required unless MAIL_MODE=off")?,
            },
            other => anyhow::bail!("unknown MAIL_MODE `{other}` (expected mailgun or off)"),
        };

        let reminders = ReminderConfig {
            hour_utc: std::env::var("REMINDER_HOUR_UTC")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .filter(|h| *h < 24)
                .unwrap_or(8),
            after_days: std::env::var("REMINDER_AFTER_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };

        Ok(Self {
            upload_root,
            jwt,
            provider,
            mail,
            reminders,
        })
    }

    /// Fixed test configuration, no environment involved.
    pub fn for_tests(upload_root: PathBuf) -> Self {
        Self {
            upload_root,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60,
            },
            provider: ProviderConfig::Mock,
            mail: MailConfig::Off,
            reminders: ReminderConfig {
                hour_utc: 8,
                after_days: 30,
            },
        }
    }
}
