//! The subscriber state machine and its lookups against the row store.
//!
//! Every lookup is a linear scan over all rows; the first matching row wins.
//! The registry takes no locks: two concurrent `create` calls for the same
//! email can both pass the duplicate check. Request volume is low enough that
//! this window is accepted rather than closed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    format_timestamp, Column, NewSubscriber, RowMappingError, SubscriberRecord,
    SubscriberStatus, Transition,
};
use crate::mailer::{MailError, Mailer};
use crate::store::{RowPosition, RowStore, StoreError};
use crate::utils::error_chain_fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// A new pending row was appended and a verification email sent.
    Created(SubscriberRecord),
    /// A pending row already existed; its token was emailed again.
    Resent(SubscriberRecord),
}

impl CreateOutcome {
    pub fn record(&self) -> &SubscriberRecord {
        match self {
            Self::Created(record) | Self::Resent(record) => record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    NotFound,
    AlreadyVerified,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    NotFound,
    AlreadyUnsubscribed,
    Unsubscribed,
}

#[derive(thiserror::Error)]
pub enum RegistryError {
    #[error("This email is already subscribed.")]
    DuplicateSubscriber,
    #[error("This email was unsubscribed.")]
    Unsubscribed,
    #[error("The subscriber row store failed")]
    Store(#[from] StoreError),
    #[error("Row {position} is not a valid subscriber")]
    MalformedRow {
        position: RowPosition,
        #[source]
        source: RowMappingError,
    },
    #[error("Failed to send the verification email")]
    Mail(#[from] MailError),
}

impl std::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Notified after a subscriber has been moved to `unsubscribed`.
#[async_trait]
pub trait UnsubscribeObserver: Send + Sync {
    async fn on_unsubscribed(&self, record: &SubscriberRecord) -> Result<(), anyhow::Error>;
}

/// Sole writer of subscriber rows.
pub struct SubscriberRegistry {
    store: Arc<dyn RowStore>,
    mailer: Arc<dyn Mailer>,
    observer: Option<Arc<dyn UnsubscribeObserver>>,
}

impl SubscriberRegistry {
    pub fn new(store: Arc<dyn RowStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            mailer,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UnsubscribeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Case-insensitive lookup by email address.
    #[tracing::instrument(name = "Finding subscriber by email", skip(self))]
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(RowPosition, SubscriberRecord)>, RegistryError> {
        let rows = self.store.list_rows().await?;
        find_row(&rows, |row| email_matches(row, email))
    }

    #[tracing::instrument(name = "Finding subscriber by token", skip(self, token))]
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<(RowPosition, SubscriberRecord)>, RegistryError> {
        let rows = self.store.list_rows().await?;
        find_row(&rows, |row| Column::VerificationToken.read(row) == token)
    }

    #[tracing::instrument(
        name = "Registering subscriber",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    pub async fn create(&self, subscriber: NewSubscriber) -> Result<CreateOutcome, RegistryError> {
        let rows = self.store.list_rows().await?;

        if let Some((_, existing)) =
            find_row(&rows, |row| email_matches(row, subscriber.email.as_ref()))?
        {
            return match existing.status {
                SubscriberStatus::Pending => {
                    // The stored row keeps its original name; only the greeting changes.
                    let mut greeting = existing.clone();
                    if let Some(name) = subscriber.name {
                        greeting.name = Some(name.as_ref().to_string());
                    }
                    self.mailer.send_verification(&greeting).await?;
                    Ok(CreateOutcome::Resent(existing))
                }
                SubscriberStatus::Verified => Err(RegistryError::DuplicateSubscriber),
                SubscriberStatus::Unsubscribed => Err(RegistryError::Unsubscribed),
            };
        }

        let token = unique_token(&rows);
        let record = SubscriberRecord::pending(subscriber, token, Utc::now());
        self.store.append_row(record.to_row()).await?;
        tracing::info!("Appended pending subscriber");

        self.mailer.send_verification(&record).await?;
        Ok(CreateOutcome::Created(record))
    }

    #[tracing::instrument(name = "Verifying subscriber", skip(self, token))]
    pub async fn verify(&self, token: &str) -> Result<VerifyOutcome, RegistryError> {
        let Some((position, record)) = self.find_by_token(token).await? else {
            return Ok(VerifyOutcome::NotFound);
        };

        match record.status.on_verify() {
            Transition::Apply(status) => {
                let verified_at = format_timestamp(Utc::now());
                self.store
                    .update_cells(
                        position,
                        &[
                            Column::Status.set(status.as_ref()),
                            Column::VerifiedAt.set(verified_at),
                        ],
                    )
                    .await?;
                tracing::info!(row = %position, "Subscriber verified");
                Ok(VerifyOutcome::Verified)
            }
            Transition::Unchanged => Ok(VerifyOutcome::AlreadyVerified),
            // The token's lifecycle ended with the unsubscribe.
            Transition::Closed => Ok(VerifyOutcome::NotFound),
        }
    }

    #[tracing::instrument(name = "Unsubscribing subscriber", skip(self, token))]
    pub async fn unsubscribe(&self, token: &str) -> Result<UnsubscribeOutcome, RegistryError> {
        let Some((position, mut record)) = self.find_by_token(token).await? else {
            return Ok(UnsubscribeOutcome::NotFound);
        };

        match record.status.on_unsubscribe() {
            Transition::Apply(status) => {
                self.store
                    .update_cells(position, &[Column::Status.set(status.as_ref())])
                    .await?;
                record.status = status;
                tracing::info!(row = %position, "Subscriber unsubscribed");
                self.notify_unsubscribed(&record).await;
                Ok(UnsubscribeOutcome::Unsubscribed)
            }
            Transition::Unchanged | Transition::Closed => {
                Ok(UnsubscribeOutcome::AlreadyUnsubscribed)
            }
        }
    }

    async fn notify_unsubscribed(&self, record: &SubscriberRecord) {
        let Some(observer) = &self.observer else {
            return;
        };
        if let Err(e) = observer.on_unsubscribed(record).await {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "Unsubscribe observer failed"
            );
        }
    }
}

/// A fresh verification token.
pub fn generate_verification_token() -> String {
    Uuid::new_v4().to_string()
}

fn unique_token(rows: &[Vec<String>]) -> String {
    loop {
        let token = generate_verification_token();
        if !rows
            .iter()
            .any(|row| Column::VerificationToken.read(row) == token)
        {
            return token;
        }
    }
}

fn email_matches(row: &[String], email: &str) -> bool {
    let cell = Column::Email.read(row).trim();
    !cell.is_empty() && cell.to_lowercase() == email.trim().to_lowercase()
}

fn find_row(
    rows: &[Vec<String>],
    matches: impl Fn(&[String]) -> bool,
) -> Result<Option<(RowPosition, SubscriberRecord)>, RegistryError> {
    let Some((index, row)) = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !Column::Email.read(row).trim().is_empty())
        .find(|(_, row)| matches(row))
    else {
        return Ok(None);
    };

    let position = RowPosition::from_data_index(index);
    SubscriberRecord::from_row(row)
        .map(|record| Some((position, record)))
        .map_err(|source| RegistryError::MalformedRow { position, source })
}
