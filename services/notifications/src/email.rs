//! Email transports

use crate::error::{NotifyError, Result};
use crate::traits::EmailTransport;
use async_trait::async_trait;
use config::EmailApiConfig;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 256;

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// JSON POST to a transactional email API authenticated with a bearer key
pub struct HttpEmailTransport {
    http: Client,
    endpoint: Url,
    api_key: String,
    from: String,
}

impl HttpEmailTransport {
    pub fn new(config: &EmailApiConfig, from: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: Url::parse(&config.endpoint)?,
            api_key: config.api_key.clone(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send_email(&self, to: &[String], subject: &str, html: &str) -> Result<()> {
        if to.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&EmailRequest {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(recipients = to.len(), subject, "Email accepted by provider");
        Ok(())
    }

    async fn test_connectivity(&self) -> bool {
        match self
            .http
            .get(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                let reachable = !status.is_server_error()
                    && status != StatusCode::UNAUTHORIZED
                    && status != StatusCode::FORBIDDEN;
                if !reachable {
                    warn!(status = status.as_u16(), "Email provider rejected connectivity check");
                }
                reachable
            }
            Err(e) => {
                warn!(error = %e, "Email provider unreachable");
                false
            }
        }
    }
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogOnlyTransport;

#[async_trait]
impl EmailTransport for LogOnlyTransport {
    async fn send_email(&self, to: &[String], subject: &str, html: &str) -> Result<()> {
        info!(recipients = ?to, subject, bytes = html.len(), "📧 Email (log only)");
        Ok(())
    }

    async fn test_connectivity(&self) -> bool {
        true
    }
}
