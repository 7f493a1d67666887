use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{format_timestamp, SubscriberRecord};
use crate::registry::UnsubscribeObserver;
use crate::store::RowStore;

const UNSUBSCRIBE_ACTION: &str = "unsubscribe";

/// Appends one row per unsubscribe to a separate sheet:
/// `[timestamp, action, email, token]`.
pub struct AuditLog {
    store: Arc<dyn RowStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UnsubscribeObserver for AuditLog {
    #[tracing::instrument(
        name = "Recording unsubscribe in audit log",
        skip(self, record),
        fields(subscriber_email = %record.email)
    )]
    async fn on_unsubscribed(&self, record: &SubscriberRecord) -> Result<(), anyhow::Error> {
        self.store
            .append_row(vec![
                format_timestamp(Utc::now()),
                UNSUBSCRIBE_ACTION.to_string(),
                record.email.to_string(),
                record.verification_token.clone(),
            ])
            .await?;
        Ok(())
    }
}
