use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;

use crate::config::SmtpConfig;

use super::error::ServiceError;

/// Outbound notifications: activation codes for new or locked-out accounts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_activation_code(&self, recipient: &str, code: &str)
        -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    sender: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "SMTP notifier initialized");

        Ok(Self {
            mailer,
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_activation_code(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        let body = format!(
            "An account was prepared for you.\n\nUse the following one-time code to set your password:\n\n{code}\n\nIf you did not expect this message, please ignore it.",
        );

        let email = Message::builder()
            .from(
                self.sender
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        ServiceError::Internal(e.into())
                    })?,
            )
            .to(recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Internal(e.into()))?)
            .subject("Your account activation code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| ServiceError::Internal(e.into()))?;

        // Sending is synchronous in lettre's smtp transport; keep it off the
        // async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %recipient, "Activation code sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %recipient, "Failed to send activation code");
                Err(ServiceError::Internal(anyhow::anyhow!(e.to_string())))
            }
        }
    }
}

/// Records sent codes instead of mailing them. Used by the test suite.
#[derive(Default)]
pub struct MockNotifier {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_to(&self, recipient: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|(to, _)| to == recipient)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_activation_code(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), code.to_string()));
        Ok(())
    }
}
