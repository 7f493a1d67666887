use actix_web::{web, HttpResponse};

use crate::registry::{SubscriberRegistry, VerifyOutcome};
use crate::routes::{RedirectPages, TokenParameters, VerifyErrorReason};
use crate::utils::found;

#[tracing::instrument(name = "Verifying a subscription", skip(params, registry, pages))]
pub async fn verify(
    params: Option<web::Query<TokenParameters>>,
    registry: web::Data<SubscriberRegistry>,
    pages: web::Data<RedirectPages>,
) -> HttpResponse {
    let Some(token) = params.as_deref().and_then(TokenParameters::token) else {
        return found(pages.verify_error(VerifyErrorReason::MissingToken));
    };

    let location = match registry.verify(token).await {
        Ok(VerifyOutcome::Verified) => pages.verify_success(false),
        Ok(VerifyOutcome::AlreadyVerified) => pages.verify_success(true),
        Ok(VerifyOutcome::NotFound) => pages.verify_error(VerifyErrorReason::InvalidToken),
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "Failed to verify subscriber");
            pages.verify_error(VerifyErrorReason::Error)
        }
    };
    found(location)
}
