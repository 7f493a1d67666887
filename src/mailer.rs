use async_trait::async_trait;
use tera::{Context, Tera};

use crate::configuration::ApplicationBaseUrl;
use crate::domain::SubscriberRecord;
use crate::email_client::EmailClient;

const VERIFICATION_SUBJECT: &str = "Verify your heat alert subscription";
const VERIFICATION_HTML: &str = "verification.html";
const VERIFICATION_TEXT: &str = "verification.txt";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to render the verification email")]
    Render(#[from] tera::Error),
    #[error("Failed to deliver the verification email")]
    Delivery(#[from] reqwest::Error),
}

/// Outbound mail used by the subscriber registry.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, record: &SubscriberRecord) -> Result<(), MailError>;
}

/// Templates compiled into the binary.
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (
            VERIFICATION_HTML,
            include_str!("../templates/verification.html"),
        ),
        (VERIFICATION_TEXT, include_str!("../templates/verification.txt")),
    ])?;
    Ok(tera)
}

pub struct VerificationMailer {
    email_client: EmailClient,
    templates: Tera,
    base_url: ApplicationBaseUrl,
}

impl VerificationMailer {
    pub fn new(email_client: EmailClient, templates: Tera, base_url: ApplicationBaseUrl) -> Self {
        Self {
            email_client,
            templates,
            base_url,
        }
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/verify?token={}",
            self.base_url.0.trim_end_matches('/'),
            urlencoding::encode(token)
        )
    }

    fn context(&self, record: &SubscriberRecord) -> Context {
        let mut context = Context::new();
        context.insert("name", &record.name);
        context.insert("districts", &record.districts.iter().collect::<Vec<_>>());
        context.insert("receive_forecasts", &record.receive_forecasts);
        context.insert(
            "verify_url",
            &self.verification_link(&record.verification_token),
        );
        context
    }
}

#[async_trait]
impl Mailer for VerificationMailer {
    #[tracing::instrument(
        name = "Sending verification email",
        skip(self, record),
        fields(subscriber_email = %record.email)
    )]
    async fn send_verification(&self, record: &SubscriberRecord) -> Result<(), MailError> {
        let context = self.context(record);
        let html_body = self.templates.render(VERIFICATION_HTML, &context)?;
        let text_body = self.templates.render(VERIFICATION_TEXT, &context)?;

        self.email_client
            .send_email(&record.email, VERIFICATION_SUBJECT, &html_body, &text_body)
            .await?;

        Ok(())
    }
}
