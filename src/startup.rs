use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use anyhow::Context;

use crate::audit::AuditLog;
use crate::configuration::{ApplicationBaseUrl, Settings};
use crate::email_client::EmailClient;
use crate::mailer::{templates, VerificationMailer};
use crate::registry::{SubscriberRegistry, UnsubscribeObserver};
use crate::routes::RedirectPages;
use crate::run;
use crate::store::{RowStore, SheetsClient};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Wires the registry to the configured spreadsheet.
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let sheets = SheetsClient::new(
            config.sheets.base_url.clone(),
            config.sheets.spreadsheet_id.clone(),
            config.sheets.sheet_name.clone(),
            config.sheets.access_token.clone(),
            config.sheets.timeout(),
        );
        let observer: Option<Arc<dyn UnsubscribeObserver>> =
            config.sheets.audit_sheet_name.as_deref().map(|name| {
                let audit_sheet = Arc::new(sheets.for_sheet(name));
                Arc::new(AuditLog::new(audit_sheet)) as Arc<dyn UnsubscribeObserver>
            });

        Self::build_with_store(config, Arc::new(sheets), observer).await
    }

    pub async fn build_with_store(
        config: Settings,
        store: Arc<dyn RowStore>,
        observer: Option<Arc<dyn UnsubscribeObserver>>,
    ) -> Result<Self, anyhow::Error> {
        let sender_email = config
            .email
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address")?;
        let email_client = EmailClient::new(
            config.email.base_url.clone(),
            sender_email,
            config.email.token.clone(),
            config.email.timeout(),
        );
        let mailer = VerificationMailer::new(
            email_client,
            templates().context("Failed to compile email templates")?,
            ApplicationBaseUrl(config.application.base_url.clone()),
        );

        let mut registry = SubscriberRegistry::new(store, Arc::new(mailer));
        if let Some(observer) = observer {
            registry = registry.with_observer(observer);
        }

        let address = (config.application.host.as_str(), config.application.port);
        let listener = TcpListener::bind(address).context("Failed to bind the listener")?;
        let port = listener.local_addr()?.port();
        tracing::info!("Starting service on port {}", port);

        let server = run(
            listener,
            registry,
            RedirectPages::new(config.redirects.dashboard_url),
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
