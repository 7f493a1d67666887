use actix_web::HttpResponse;

#[tracing::instrument(name = "Health check")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().finish()
}
