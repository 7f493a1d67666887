use actix_web::{web, HttpResponse};

use crate::registry::{SubscriberRegistry, UnsubscribeOutcome};
use crate::routes::{RedirectPages, TokenParameters};
use crate::utils::found;

/// Every outcome except an actual unsubscribe lands on the `already=true`
/// page, so the link reveals nothing about which tokens exist.
#[tracing::instrument(name = "Unsubscribing", skip(params, registry, pages))]
pub async fn unsubscribe(
    params: Option<web::Query<TokenParameters>>,
    registry: web::Data<SubscriberRegistry>,
    pages: web::Data<RedirectPages>,
) -> HttpResponse {
    let Some(token) = params.as_deref().and_then(TokenParameters::token) else {
        return found(pages.unsubscribe_success(true));
    };

    let unsubscribed = match registry.unsubscribe(token).await {
        Ok(UnsubscribeOutcome::Unsubscribed) => true,
        Ok(UnsubscribeOutcome::AlreadyUnsubscribed | UnsubscribeOutcome::NotFound) => false,
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "Failed to unsubscribe");
            false
        }
    };
    found(pages.unsubscribe_success(!unsubscribed))
}
