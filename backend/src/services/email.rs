//! Out-of-band delivery of login links.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait LoginMailer: Send + Sync {
    /// Deliver a login link carrying `token` to `to_email`.
    async fn send_login_link(&self, to_email: &str, token: &str) -> Result<(), MailError>;
}

pub fn login_link_url(public_base_url: &str, token: &str) -> String {
    format!("{}/login/{}", public_base_url.trim_end_matches('/'), token)
}

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    public_base_url: String,
    skip_send: bool,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, public_base_url: &str) -> Result<Self, MailError> {
        let mailer = if smtp.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
                .port(smtp.port)
                .build()
        } else {
            let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                .port(smtp.port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            mailer,
            from_address: smtp.from_address.clone(),
            public_base_url: public_base_url.to_string(),
            skip_send: smtp.skip_send,
        })
    }
}

#[async_trait]
impl LoginMailer for SmtpMailer {
    async fn send_login_link(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        if self.skip_send {
            tracing::info!(to = %to_email, "SMTP_SKIP_SEND set; login link not delivered");
            return Ok(());
        }

        let body = format!(
            "Use the link below to sign in.\r\n\r\n{}\r\n",
            login_link_url(&self.public_base_url, token)
        );

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to_email.parse()?)
            .subject("Login Link")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(email).await?;
        tracing::debug!(to = %to_email, "Login link sent");
        Ok(())
    }
}
