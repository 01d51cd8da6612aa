//! Confirmation e-mail sent to an applicant after a successful submit.
//!
//! Mail is optional: without an SMTP host and a from address no
//! [`Mailer`] is built and submits go through without sending anything.

use std::sync::Arc;

use clap::Args;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::models::ApplicationForm;

pub const CONFIRMATION_SUBJECT: &str =
    "We received your application for the 4TU.ResearchData FAIR Data Fund.";

/// SMTP settings, all optional.
#[derive(Debug, Clone, Args)]
pub struct MailConfig {
    /// SMTP server; mail is disabled without it
    #[arg(long, env = "FAIRFUND_SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "FAIRFUND_SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "FAIRFUND_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "FAIRFUND_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address
    #[arg(long, env = "FAIRFUND_SMTP_FROM")]
    pub smtp_from: Option<String>,

    /// Upgrade the connection with STARTTLS
    #[arg(long, env = "FAIRFUND_SMTP_STARTTLS")]
    pub smtp_starttls: bool,

    /// Prepended to every subject, e.g. `[test]`
    #[arg(long, env = "FAIRFUND_SMTP_SUBJECT_PREFIX")]
    pub smtp_subject_prefix: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            smtp_starttls: false,
            smtp_subject_prefix: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address '{0}'")]
    Address(String),

    #[error("Application has no e-mail address")]
    NoRecipient,

    #[error("Could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Sends confirmation mails through one SMTP relay.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    subject_prefix: Option<String>,
}

impl Mailer {
    /// Build a mailer, or `None` when mail is not configured.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        let host = config.smtp_host.as_deref().filter(|h| !h.is_empty())?;
        let from = match config.smtp_from.as_deref()?.parse::<Mailbox>() {
            Ok(from) => from,
            Err(e) => {
                tracing::error!("Mail disabled, invalid sender address: {}", e);
                return None;
            }
        };

        let builder = if config.smtp_starttls {
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::error!("Mail disabled, cannot set up STARTTLS for {}: {}", host, e);
                    return None;
                }
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(config.smtp_port);
        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(user.clone(), password.clone())),
            _ => builder,
        };

        tracing::info!(host = %host, port = config.smtp_port, "Confirmation mail enabled");
        Some(Self {
            transport: Arc::new(builder.build()),
            from,
            subject_prefix: config.smtp_subject_prefix.clone(),
        })
    }

    fn subject(&self) -> String {
        match &self.subject_prefix {
            Some(prefix) => format!("{} {}", prefix, CONFIRMATION_SUBJECT),
            None => CONFIRMATION_SUBJECT.to_string(),
        }
    }

    /// The confirmation mail for a submitted application.
    pub fn confirmation(&self, form: &ApplicationForm) -> Result<Message, MailError> {
        let address = form.fields.email.as_deref().ok_or(MailError::NoRecipient)?;
        let to: Mailbox = address
            .parse()
            .map_err(|_| MailError::Address(address.to_string()))?;

        let name = form.fields.name.as_deref().unwrap_or("applicant");
        let body = format!(
            "Dear {},\n\n\
             Thank you for applying to the 4TU.ResearchData FAIR Data Fund.\n\
             Your application has been received. Its reference is:\n\n\
             {}\n\n\
             Kind regards,\n4TU.ResearchData\n",
            name, form.uuid
        );

        Ok(Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(self.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(body)?)
    }

    pub async fn send_confirmation(&self, form: &ApplicationForm) -> Result<(), MailError> {
        let message = self.confirmation(form)?;
        self.transport.send(message).await?;
        tracing::info!("Sent confirmation mail for {}", form.uuid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> MailConfig {
        MailConfig {
            smtp_host: Some("localhost".into()),
            smtp_port: 2525,
            smtp_from: Some("FAIR Data Fund <fund@example.org>".into()),
            smtp_subject_prefix: Some("[test]".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_config_disables_mail() {
        assert!(Mailer::from_config(&MailConfig::default()).is_none());

        let no_sender = MailConfig { smtp_host: Some("localhost".into()), ..Default::default() };
        assert!(Mailer::from_config(&no_sender).is_none());

        let bad_sender = MailConfig { smtp_from: Some("not an address".into()), ..configured() };
        assert!(Mailer::from_config(&bad_sender).is_none());
    }

    #[test]
    fn test_confirmation_message() {
        let mailer = Mailer::from_config(&configured()).unwrap();
        let mut form = ApplicationForm::new();
        form.fields.name = Some("Ada".into());
        form.fields.email = Some("ada@example.org".into());

        let text = String::from_utf8(mailer.confirmation(&form).unwrap().formatted()).unwrap();

        assert!(text.contains("To: ada@example.org"));
        assert!(text.contains("Subject: [test] We received your application"));
        assert!(text.contains(&form.uuid.to_string()));
    }

    #[test]
    fn test_confirmation_needs_a_valid_recipient() {
        let mailer = Mailer::from_config(&configured()).unwrap();
        let mut form = ApplicationForm::new();
        assert!(matches!(mailer.confirmation(&form), Err(MailError::NoRecipient)));

        form.fields.email = Some("nope".into());
        assert!(matches!(mailer.confirmation(&form), Err(MailError::Address(_))));
    }
}
