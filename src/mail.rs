use axum::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::MailConfig;

/// Outbound mail seam. Production uses SMTP; tests plug in a no-op.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_recovery_code(&self, to: &str, name: &str, code: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_recovery_code(&self, to: &str, name: &str, code: &str) -> anyhow::Result<()> {
        let body = format!(
            "Hello {name},\n\n\
             You requested a password recovery for your account.\n\
             Your recovery code is: {code}\n\n\
             This code is valid for 15 minutes. If you did not request this,\n\
             please ignore this email.\n"
        );
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject("Password recovery code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;
        self.transport.send(message).await?;
        info!(to = %to, "recovery code email sent");
        Ok(())
    }
}
