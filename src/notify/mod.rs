use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Trade,
    HighOpportunity,
    PriceAlert,
    StatusReport,
}

impl NotificationKind {
    fn label(&self) -> &'static str {
        match self {
            NotificationKind::Trade => "trade",
            NotificationKind::HighOpportunity => "high_opportunity",
            NotificationKind::PriceAlert => "price_alert",
            NotificationKind::StatusReport => "status_report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            priority,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Delivery capability. The core only ever depends on this trait, never on a
/// concrete channel.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Prints notifications to stdout.
pub struct ConsoleChannel;

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        println!("{}", "=".repeat(60));
        println!(
            "{:?} ALERT: {}",
            notification.priority, notification.title
        );
        println!(
            "Time: {}",
            notification.timestamp.format("%Y-%m-%d %H:%M UTC")
        );
        println!("{}", "=".repeat(60));
        println!("{}", notification.message);
        Ok(())
    }
}

/// Writes each notification as a JSON file into a directory.
pub struct FileChannel {
    output_dir: PathBuf,
}

impl FileChannel {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for FileChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let filename = format!(
            "{}_{}.json",
            notification.timestamp.format("%Y%m%d_%H%M%S"),
            notification.kind.label()
        );
        let path = self.output_dir.join(filename);
        let payload = serde_json::to_string_pretty(notification)?;
        tokio::fs::write(&path, payload).await?;
        info!("Notification saved to {}", path.display());
        Ok(())
    }
}

/// POSTs notifications as JSON to a webhook endpoint.
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::NotificationError(format!(
                "webhook responded with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Fans a notification out to every registered channel. A failing channel is
/// logged and skipped; delivery is best-effort.
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub async fn notify(&self, notification: &Notification) {
        for channel in &self.channels {
            if let Err(e) = channel.send(notification).await {
                error!("Notification delivery failed: {}", e);
            }
        }
    }
}
