use actix_web::http::{header, Method};
use actix_web::middleware::DefaultHeaders;
use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::registry::SubscriberRegistry;
use crate::routes::RedirectPages;

pub mod audit;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod mailer;
pub mod registry;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;

pub fn run(
    listener: std::net::TcpListener,
    registry: SubscriberRegistry,
    pages: RedirectPages,
) -> Result<Server, std::io::Error> {
    let registry = web::Data::new(registry);
    let pages = web::Data::new(pages);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")))
            .app_data(web::JsonConfig::default().error_handler(routes::json_error_handler))
            .route("/healthz", web::get().to(routes::ping))
            .service(
                web::resource("/subscribe")
                    .route(web::post().to(routes::subscribe))
                    .route(web::method(Method::OPTIONS).to(routes::subscribe_preflight)),
            )
            .route("/verify", web::get().to(routes::verify))
            .route("/unsubscribe", web::get().to(routes::unsubscribe))
            .app_data(registry.clone())
            .app_data(pages.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
