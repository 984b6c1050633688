//! Email service for delivering login one-time passwords.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
        })
    }

    pub async fn send_otp_email(&self, to_email: &str, to_name: &str, otp: &str) -> Result<(), Error> {
        let subject = "Your login code";
        let body = self.create_otp_body(to_name, otp);
        self.send_email(to_email, to_name, subject, &body).await
    }

    async fn send_email(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = format!("{to_name} <{to_email}>")
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse to email: {e}"),
            })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_otp_body(&self, to_name: &str, otp: &str) -> String {
        format!(
            r#"<html>
<body style="font-family: sans-serif;">
  <p>Hello {to_name},</p>
  <p>Your login code is:</p>
  <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{otp}</p>
  <p>Enter it within the next few minutes to sign in. If you did not request
  this code, you can ignore this email.</p>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &std::path::Path) -> Config {
        Config {
            email: crate::config::EmailConfig {
                transport: crate::config::EmailTransportConfig::File {
                    path: dir.to_string_lossy().into_owned(),
                },
                from_email: "noreply@example.com".to_string(),
                from_name: "PrepMate".to_string(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn otp_email_writes_to_file_transport() {
        let dir = std::env::temp_dir().join(format!("prepmate-emails-{}", uuid::Uuid::new_v4()));
        let service = EmailService::new(&file_config(&dir)).unwrap();

        service
            .send_otp_email("asha@example.com", "Asha", "123456")
            .await
            .unwrap();

        let wrote_one = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(wrote_one, 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn otp_body_contains_code_and_name() {
        let dir = std::env::temp_dir();
        let service = EmailService::new(&file_config(&dir)).unwrap();
        let body = service.create_otp_body("Asha", "987654");
        assert!(body.contains("987654"));
        assert!(body.contains("Asha"));
    }
}
