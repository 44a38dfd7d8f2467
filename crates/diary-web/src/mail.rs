use std::sync::Arc;

use diary_core::forms::Inquiry;
use diary_core::util::{compact_text, sanitize};
use serde::Serialize;

use crate::config::MailConfig;
use crate::error::AppError;

/// An outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

impl OutgoingMail {
    /// Mail sent to the site owners for a contact request, copying the sender
    pub fn for_inquiry(inquiry: &Inquiry, config: &MailConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.recipients.clone(),
            cc: vec![inquiry.email.clone()],
            reply_to: Some(inquiry.email.clone()),
            subject: inquiry.title.clone(),
            text: inquiry.email_body(),
        }
    }
}

/// Where outgoing mail goes
#[derive(Debug, Clone)]
pub enum MailTransport {
    /// POST the message as JSON to an HTTP mail relay
    Relay(RelayMailer),
    /// Write the message to the log
    Console,
}

impl MailTransport {
    pub fn from_config(config: &Arc<crate::config::AppConfig>) -> Self {
        match config.mail.relay_url.clone() {
            Some(url) => Self::Relay(RelayMailer {
                client: reqwest::Client::new(),
                url,
                token: config.mail.relay_token.clone(),
            }),
            None => Self::Console,
        }
    }

    pub async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        match self {
            Self::Relay(relay) => relay.send(mail).await,
            Self::Console => {
                tracing::info!(
                    from = %mail.from,
                    to = ?mail.to,
                    cc = ?mail.cc,
                    subject = %mail.subject,
                    "Console mail transport:\n{}",
                    mail.text
                );
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(mail);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            AppError::external(format!("Mail relay request failed: {}", sanitize(&error)))
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(format!(
                "Mail relay request failed with HTTP {}: {}",
                status,
                compact_text(&body)
            )));
        }

        Ok(())
    }
}
