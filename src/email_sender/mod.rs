use crate::calendar::CalendarDocument;
use crate::config::Settings;
pub mod message;

use lettre::{
    address::AddressError,
    error::Error as LettreError,
    message::header::ContentTypeErr,
    transport::smtp::authentication::Credentials,
    Message,
    SmtpTransport,
    Transport,
};
use log::{debug, info, trace, warn};
use thiserror::Error;

/// Plain SMTP port used when SSL is disabled.
pub const SMTP_PORT: u16 = 25;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to parse email address: {0}")]
    Address(#[from] AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] LettreError),

    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    #[error("Failed to create SMTP transport: {0}")]
    TransportCreation(lettre::transport::smtp::Error),

    #[error("Failed to send email: {0}")]
    Send(Box<dyn std::error::Error + Send + Sync>),
}

/// Sends calendar documents over one configured transport.
pub struct Mailer<T: Transport> {
    transport: T,
}

impl Mailer<SmtpTransport> {
    /// With `use_ssl` the connection is implicit TLS on the submissions port
    /// with a login; without it, plain SMTP on port 25 and no login at all.
    pub fn connect(settings: &Settings) -> Result<Self, MailError> {
        let transport = if settings.use_ssl {
            let creds = Credentials::new(
                settings.username.clone(),
                settings.get_password().to_string(),
            );
            debug!("Using implicit TLS to {} as {}", settings.server, settings.username);
            SmtpTransport::relay(&settings.server)
                .map_err(MailError::TransportCreation)?
                .credentials(creds)
                .build()
        } else {
            if settings.has_password() {
                warn!(
                    "use_ssl is off: connecting to {}:{} without TLS, the configured password is not used",
                    settings.server, SMTP_PORT
                );
            }
            SmtpTransport::builder_dangerous(&settings.server)
                .port(SMTP_PORT)
                .build()
        };
        Ok(Mailer::new(transport))
    }
}

impl<T> Mailer<T>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(transport: T) -> Self {
        Mailer { transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the mail for `document` and sends it once. No retries.
    pub fn send_document(
        &self,
        document: &CalendarDocument,
        text: &str,
        sender: &str,
        to: &str,
        program: &str,
    ) -> Result<(), MailError> {
        let email = message::build_message(document, text, sender, to, program)?;
        self.send(&email)?;
        println!(
            "Reminder '{}' sent to {}!",
            document.event().summary,
            to
        );
        Ok(())
    }

    pub fn send(&self, email: &Message) -> Result<(), MailError> {
        trace!(
            "Outgoing message:\n{}",
            String::from_utf8_lossy(&email.formatted())
        );
        match self.transport.send(email) {
            Ok(_) => {
                info!("Sent message to {:?}", email.envelope().to());
                Ok(())
            }
            Err(e) => {
                eprintln!("Error sending email to {:?}: {:?}", email.envelope().to(), e);
                Err(MailError::Send(Box::new(e)))
            }
        }
    }
}
