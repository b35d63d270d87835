//! Reconnecting push-channel observer
//!
//! Connects to the catalog's WebSocket endpoint, decodes each pushed event and
//! hands it to a callback. When the connection drops or cannot be established it
//! waits and tries again, forever.

use anyhow::{bail, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::CatalogEvent;

/// Delay schedule between reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to each wait
    pub max_jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl ReconnectPolicy {
    /// Backoff before the given attempt (0 = first retry), jitter excluded
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.min(16));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(fastrand::u64(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        self.backoff(attempt) + jitter
    }
}

pub struct ObserverClient {
    url: Url,
    policy: ReconnectPolicy,
}

impl ObserverClient {
    pub fn new(url: &str, policy: ReconnectPolicy) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!("push channel URL must use ws:// or wss://, got {}", url.scheme());
        }
        Ok(Self { url, policy })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Observe events until the task is cancelled
    pub async fn run<F>(&self, mut on_event: F)
    where
        F: FnMut(CatalogEvent) + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!(url = %self.url, "Push channel connected");
                    attempt = 0;
                    match Self::pump(stream, &mut on_event).await {
                        Ok(()) => info!(url = %self.url, "Push channel closed"),
                        Err(e) => warn!(url = %self.url, "Push channel error: {}", e),
                    }
                }
                Err(e) => warn!(url = %self.url, "Failed to connect to push channel: {}", e),
            }

            let delay = self.policy.delay_for(attempt);
            info!(url = %self.url, attempt, "Reconnecting in {:?}", delay);
            tokio::time::sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Hold one connection open, delivering events until it ends
    pub async fn observe_once<F>(&self, on_event: &mut F) -> Result<()>
    where
        F: FnMut(CatalogEvent) + Send,
    {
        let (stream, _) = connect_async(self.url.as_str()).await?;
        Self::pump(stream, on_event).await
    }

    async fn pump<F>(
        mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(CatalogEvent) + Send,
    {
        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => match serde_json::from_str::<CatalogEvent>(&text) {
                    Ok(event) => on_event(event),
                    Err(e) => warn!("Ignoring unrecognised push message: {} ({})", text, e),
                },
                Message::Close(frame) => {
                    debug!(?frame, "Push channel close frame received");
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
