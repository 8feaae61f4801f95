//! Outbound email
//!
//! The auth layer only needs one capability, sending a verification token to
//! an address. `SmtpMailer` delivers over SMTP with STARTTLS; `LogMailer` is
//! the development fallback when no SMTP host is configured.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const VERIFICATION_SUBJECT: &str = "Verify Your Email - Internship Hub";

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Something that can deliver verification emails
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailError>;
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Link the user follows to redeem a token
pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/verify-email?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

fn verification_body(link: &str) -> String {
    format!(
        r#"
        <h2>Welcome to Internship Hub!</h2>
        <p>Thank you for signing up! Please click the link below to verify your email address:</p>
        <a href="{link}" style="background-color: #4CAF50; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">Verify Email</a>
        <p>Or copy and paste this link in your browser: {link}</p>
        <p>This link expires in 24 hours.</p>
        <p>If you didn't create an account, please ignore this email.</p>
        "#
    )
}

/// SMTP mailer backed by lettre's async transport
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, frontend_url: impl Into<String>) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.username.parse()?,
            frontend_url: frontend_url.into(),
        })
    }

    fn build_message(&self, to: &str, token: &str) -> Result<Message, MailError> {
        let link = verification_link(&self.frontend_url, token);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(verification_body(&link))?;

        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailError> {
        let message = self.build_message(to, token)?;
        self.transport.send(message).await?;

        tracing::info!("Verification email sent to {}", to);
        Ok(())
    }
}

/// Writes the verification link to the log instead of sending mail
#[derive(Debug, Clone)]
pub struct LogMailer {
    frontend_url: String,
}

impl LogMailer {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailError> {
        tracing::warn!(
            "SMTP not configured; verification link for {}: {}",
            to,
            verification_link(&self.frontend_url, token)
        );
        Ok(())
    }
}
