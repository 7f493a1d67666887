use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{Districts, NewSubscriber, SubscriberEmail, SubscriberStatus};
use crate::store::CellUpdate;

/// Sheet columns of the subscriber table, 1-based like the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Email = 1,
    Name,
    Districts,
    ReceiveForecasts,
    VerificationToken,
    Status,
    SubscribedAt,
    VerifiedAt,
    LastAlertSent,
}

impl Column {
    pub const COUNT: usize = 9;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Cell value in `row`; cells the backend omitted read as empty.
    pub fn read(self, row: &[String]) -> &str {
        row.get(self.index() - 1).map(String::as_str).unwrap_or("")
    }

    pub fn set(self, value: impl Into<String>) -> CellUpdate {
        CellUpdate::new(self.index(), value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RowMappingError {
    #[error("Invalid email address `{0}`")]
    Email(String),
    #[error("Unknown subscriber status `{0}`")]
    Status(String),
    #[error("Invalid forecast preference `{0}`")]
    ForecastPreference(String),
    #[error("Row has no verification token")]
    MissingToken,
    #[error("Row has no {0:?} timestamp")]
    MissingTimestamp(Column),
    #[error("A pending row must not have a {0:?} timestamp")]
    UnexpectedTimestamp(Column),
    #[error("Invalid {column:?} timestamp `{value}`")]
    Timestamp {
        column: Column,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// One subscriber as persisted in the row store.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberRecord {
    pub email: SubscriberEmail,
    pub name: Option<String>,
    pub districts: Districts,
    pub receive_forecasts: bool,
    pub verification_token: String,
    pub status: SubscriberStatus,
    pub subscribed_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub last_alert_sent: Option<String>,
}

impl SubscriberRecord {
    pub fn pending(
        subscriber: NewSubscriber,
        verification_token: String,
        subscribed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email: subscriber.email,
            name: subscriber.name.map(|n| n.as_ref().to_string()),
            districts: subscriber.districts,
            receive_forecasts: subscriber.receive_forecasts,
            verification_token,
            status: SubscriberStatus::Pending,
            subscribed_at,
            verified_at: None,
            last_alert_sent: None,
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.email.to_string(),
            self.name.clone().unwrap_or_default(),
            self.districts.to_cell(),
            if self.receive_forecasts { "yes" } else { "no" }.to_string(),
            self.verification_token.clone(),
            self.status.to_string(),
            format_timestamp(self.subscribed_at),
            self.verified_at.map(format_timestamp).unwrap_or_default(),
            self.last_alert_sent.clone().unwrap_or_default(),
        ]
    }

    pub fn from_row(row: &[String]) -> Result<Self, RowMappingError> {
        let email = Column::Email.read(row);
        let email = SubscriberEmail::parse(email.to_string())
            .map_err(|_| RowMappingError::Email(email.to_string()))?;

        let status = Column::Status.read(row).trim();
        let status = SubscriberStatus::from_str(status)
            .map_err(|_| RowMappingError::Status(status.to_string()))?;

        let verification_token = Column::VerificationToken.read(row).trim();
        if verification_token.is_empty() {
            return Err(RowMappingError::MissingToken);
        }

        let subscribed_at = parse_timestamp(Column::SubscribedAt, row)?
            .ok_or(RowMappingError::MissingTimestamp(Column::SubscribedAt))?;

        // Unsubscribed rows may or may not have been verified first.
        let verified_at = parse_timestamp(Column::VerifiedAt, row)?;
        match (status, verified_at) {
            (SubscriberStatus::Verified, None) => {
                return Err(RowMappingError::MissingTimestamp(Column::VerifiedAt));
            }
            (SubscriberStatus::Pending, Some(_)) => {
                return Err(RowMappingError::UnexpectedTimestamp(Column::VerifiedAt));
            }
            _ => {}
        }

        Ok(Self {
            email,
            name: non_empty(Column::Name.read(row)),
            districts: Districts::from_cell(Column::Districts.read(row)),
            receive_forecasts: parse_forecast_preference(Column::ReceiveForecasts.read(row))?,
            verification_token: verification_token.to_string(),
            status,
            subscribed_at,
            verified_at,
            last_alert_sent: non_empty(Column::LastAlertSent.read(row)),
        })
    }
}

/// UTC, RFC 3339, microsecond precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(
    column: Column,
    row: &[String],
) -> Result<Option<DateTime<Utc>>, RowMappingError> {
    let value = column.read(row).trim();
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|at| Some(at.with_timezone(&Utc)))
        .map_err(|source| RowMappingError::Timestamp {
            column,
            value: value.to_string(),
            source,
        })
}

fn parse_forecast_preference(value: &str) -> Result<bool, RowMappingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        _ => Err(RowMappingError::ForecastPreference(value.to_string())),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
