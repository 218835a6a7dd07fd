use std::time::Duration;

use async_trait::async_trait;
use log::info;
use serde::Serialize;

use crate::config::{MailConfig, Secret};
use crate::domain::errors::DomainError;
use crate::domain::ports::{Email, Mailer};

/// Posts mail to an HTTP relay.
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    token: Option<Secret<String>>,
    from: String,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(
        endpoint: &str,
        token: Option<Secret<String>>,
        from: &str,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Configuration(format!("mail client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token,
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: Email) -> Result<(), DomainError> {
        let mut request = self.http.post(&self.endpoint).json(&RelayMessage {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.reveal());
        }
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Internal(format!("mail relay unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(DomainError::Internal(format!(
                "mail relay answered {}",
                response.status()
            )));
        }
        info!("Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

/// Writes mail to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), DomainError> {
        info!(
            "Mail relay not configured; would send '{}' to {}:\n{}",
            email.subject, email.to, email.body
        );
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> Result<Box<dyn Mailer>, DomainError> {
    Ok(match &config.relay_url {
        Some(url) => Box::new(HttpMailer::new(
            url,
            config.relay_token.clone(),
            &config.from,
            config.timeout,
        )?),
        None => Box::new(LogMailer),
    })
}
