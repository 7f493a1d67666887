use actix_web::error::JsonPayloadError;
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::domain::{Districts, NewSubscriber, SubscriberEmail, SubscriberName};
use crate::registry::{CreateOutcome, RegistryError, SubscriberRegistry};
use crate::utils::error_chain_fmt;

const INVALID_EMAIL: &str = "Valid email address is required";
const UNEXPECTED_FAILURE: &str = "Failed to process subscription. Please try again.";

#[derive(serde::Deserialize)]
pub struct SubscribeBody {
    email: Option<String>,
    name: Option<String>,
    #[serde(default)]
    districts: Vec<String>,
    receive_forecasts: Option<bool>,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubscribeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscribeResponse {
    fn message(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
        }
    }

    fn error(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

impl TryFrom<SubscribeBody> for NewSubscriber {
    type Error = String;

    fn try_from(body: SubscribeBody) -> Result<Self, Self::Error> {
        let email = body
            .email
            .ok_or_else(|| INVALID_EMAIL.to_string())
            .and_then(|email| {
                SubscriberEmail::parse(email).map_err(|_| INVALID_EMAIL.to_string())
            })?;
        let districts = Districts::parse(body.districts)?;
        let name = body
            .name
            .filter(|name| !name.trim().is_empty())
            .map(SubscriberName::parse)
            .transpose()?;

        Ok(Self {
            email,
            name,
            districts,
            receive_forecasts: body.receive_forecasts.unwrap_or(true),
        })
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("This email is already subscribed.")]
    DuplicateSubscriber,
    #[error("This email was unsubscribed.")]
    Unsubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_)
            | SubscribeError::DuplicateSubscriber
            | SubscribeError::Unsubscribed => StatusCode::BAD_REQUEST,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            SubscribeError::UnexpectedError(_) => UNEXPECTED_FAILURE.to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(SubscribeResponse::error(error))
    }
}

/// Rejects bodies that are not valid JSON with the same envelope as other validation errors.
pub fn json_error_handler(error: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %error, "Rejected subscription body");
    SubscribeError::ValidationError(format!("Invalid request body: {error}")).into()
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, registry),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Json<SubscribeBody>,
    registry: web::Data<SubscriberRegistry>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = body
        .into_inner()
        .try_into()
        .map_err(SubscribeError::ValidationError)?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&new_subscriber.email),
    );

    let outcome = registry
        .create(new_subscriber)
        .await
        .map_err(|e| match e {
            RegistryError::DuplicateSubscriber => SubscribeError::DuplicateSubscriber,
            RegistryError::Unsubscribed => SubscribeError::Unsubscribed,
            e => {
                tracing::error!(error.cause_chain = ?e, "Failed to register subscriber");
                SubscribeError::UnexpectedError(
                    anyhow::Error::new(e).context("Failed to register a new subscriber"),
                )
            }
        })?;

    let message = match outcome {
        CreateOutcome::Created(_) => "Verification email sent! Please check your inbox.",
        CreateOutcome::Resent(_) => "Verification email re-sent. Please check your inbox.",
    };
    Ok(HttpResponse::Ok().json(SubscribeResponse::message(message)))
}

/// CORS preflight for browsers posting the signup form cross-origin.
pub async fn subscribe_preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .finish()
}
