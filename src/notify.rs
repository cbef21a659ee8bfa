//! Fire-and-forget access notifications.
//!
//! [`Notifier::notify`] never waits on the network. Messages go into a
//! bounded queue drained by one background task that posts them to a
//! Telegram-compatible `sendMessage` endpoint. A full queue, a dead worker, a
//! refused connection or a non-2xx reply are all logged and then forgotten:
//! no retries, no errors surfaced to the request path.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::TelegramConfig;

const QUEUE_CAPACITY: usize = 256;
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery failures. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink replied {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Handle to the notification worker. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Option<mpsc::Sender<String>>,
}

impl Notifier {
    /// Starts the delivery worker, or returns a no-op notifier when `sink`
    /// is `None`.
    ///
    /// Must be called inside a tokio runtime when `sink` is `Some`.
    pub fn spawn(sink: Option<TelegramConfig>) -> Self {
        let Some(sink) = sink else {
            debug!("notifications disabled");
            return Self::disabled();
        };

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();

        tokio::spawn(run_worker(client, sink, rx));
        Self { tx: Some(tx) }
    }

    /// A notifier that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues `text` for delivery and returns immediately.
    pub fn notify(&self, text: impl Into<String>) {
        let Some(tx) = &self.tx else { return };
        if let Err(e) = tx.try_send(text.into()) {
            warn!("notification dropped: {e}");
        }
    }
}

async fn run_worker(client: reqwest::Client, sink: TelegramConfig, mut rx: mpsc::Receiver<String>) {
    let endpoint = format!("{}/bot{}/sendMessage", sink.api_url, sink.token);

    while let Some(text) = rx.recv().await {
        if let Err(e) = deliver(&client, &endpoint, &sink.chat_id, &text).await {
            // reqwest errors embed the URL, which embeds the bot token.
            let e = match e {
                NotifyError::Transport(inner) => NotifyError::Transport(inner.without_url()),
                other => other,
            };
            warn!(error = %e, "notification delivery failed");
        }
    }

    debug!("notification worker stopped");
}

async fn deliver(
    client: &reqwest::Client,
    endpoint: &str,
    chat_id: &str,
    text: &str,
) -> Result<(), NotifyError> {
    let response = client
        .post(endpoint)
        .json(&SendMessage { chat_id, text })
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_owned());
    Err(NotifyError::Status { status: status.as_u16(), body })
}
