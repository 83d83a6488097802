use std::time::Duration;

use api::event::{EventBody, NodeMetrics};
use async_trait::async_trait;
use reqwest::{header, Client};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::{Event, EventHook};
use crate::{error::AppError, metrics, result::Result};

/// Posts every session event as JSON to one configured URL.
#[derive(Clone, Debug)]
pub struct WebHook {
    url: String,
    client: Client,
}

impl WebHook {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(300))
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap_or_else(|e| {
                warn!(url, "webhook client fallback to defaults: {}", e);
                Client::new()
            });
        WebHook { url, client }
    }

    async fn event_handler(&self, event: Event) -> Result<()> {
        let event_body = EventBody {
            metrics: node_metrics(),
            event: event.into(),
        };
        let req_body = serde_json::to_string(&event_body)?;
        match self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(req_body.clone())
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                let success = status.is_success();
                let res_body = response.text().await?;
                if success {
                    debug!(
                        url = self.url,
                        ?status,
                        req_body,
                        res_body,
                        "event webhook success"
                    );
                    Ok(())
                } else {
                    warn!(
                        url = self.url,
                        ?status,
                        req_body,
                        res_body,
                        "event webhook error"
                    );
                    Err(AppError::InternalServerError(anyhow::anyhow!(res_body)))
                }
            }
            Err(err) => {
                warn!(url = self.url, req_body, ?err, "event webhook error");
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl EventHook for WebHook {
    async fn hook(&self, mut event_receiver: broadcast::Receiver<Event>) {
        loop {
            match event_receiver.recv().await {
                Ok(event) => {
                    let _ = self.event_handler(event).await;
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(url = self.url, "event webhook skipped {} events", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn node_metrics() -> NodeMetrics {
    NodeMetrics {
        sessions: metrics::SESSION.get() as u64,
        started: metrics::STARTED.get(),
        failed: metrics::FAILED.get(),
    }
}
