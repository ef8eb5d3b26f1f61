use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: String,
        from_name: &str,
        from_address: &str,
    ) -> anyhow::Result<Self> {
        let from: Mailbox = format!("{from_name} <{from_address}>")
            .parse()
            .with_context(|| format!("invalid sender address: {from_address}"))?;
        let credentials =
            (!username.is_empty()).then(|| Credentials::new(username, password));
        Ok(Self {
            host,
            port,
            credentials,
            from,
        })
    }

    fn build_message(&self, email: OutgoingEmail) -> anyhow::Result<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .with_context(|| format!("invalid recipient address: {}", email.to))?;

        let body = match email.html {
            Some(html) => MultiPart::alternative_plain_html(email.text, html),
            None => MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(email.text),
            ),
        };

        let body = match email.attachment {
            Some(att) => {
                let content_type = ContentType::parse(&att.content_type)
                    .with_context(|| format!("invalid attachment type: {}", att.content_type))?;
                MultiPart::mixed()
                    .multipart(body)
                    .singlepart(Attachment::new(att.filename).body(att.content, content_type))
            }
            None => body,
        };

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(body)
            .context("failed to build email")
    }

    fn transport(&self) -> anyhow::Result<SmtpTransport> {
        let builder = SmtpTransport::starttls_relay(&self.host)
            .context("failed to create SMTP transport")?
            .port(self.port);
        let builder = match &self.credentials {
            Some(creds) => builder.credentials(creds.clone()),
            None => builder,
        };
        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = self.build_message(email)?;
        let transport = self.transport()?;

        // lettre's SmtpTransport blocks; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("mail task panicked")?
            .context("SMTP send failed")?;

        Ok(())
    }
}

/// Stand-in used when no SMTP host is configured: mail is logged, not sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.is_some(),
            "SMTP not configured, skipping email"
        );
        Ok(())
    }
}
