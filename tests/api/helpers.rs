use std::sync::Arc;

use alert_subscriptions::{
    audit::AuditLog,
    configuration::Settings,
    domain::Column,
    startup::Application,
    store::InMemoryRowStore,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const DASHBOARD_URL: &str = "https://dashboard.example.com";

static TRACING: Lazy<()> = Lazy::new(|| {
    let name = "test".to_string();
    let level = "debug".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(name, level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to initialise tracing");
    } else {
        let subscriber = get_subscriber(name, level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to initialise tracing");
    };
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryRowStore>,
    pub audit_store: Arc<InMemoryRowStore>,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

/// Links embedded in a verification email.
pub struct VerificationLinks {
    pub html: reqwest::Url,
    pub plain_text: reqwest::Url,
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let config = {
        let mut config = Settings::get().expect("Failed to read configuration");
        config.application.port = 0;
        config.application.base_url = "http://127.0.0.1".into();
        config.email.base_url = email_server.uri();
        config.redirects.dashboard_url = DASHBOARD_URL.into();
        config
    };

    let store = Arc::new(InMemoryRowStore::new());
    let audit_store = Arc::new(InMemoryRowStore::new());
    let app = Application::build_with_store(
        config,
        store.clone(),
        Some(Arc::new(AuditLog::new(audit_store.clone()))),
    )
    .await
    .expect("Failed to build app.");

    let port = app.port();
    tokio::spawn(app.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        store,
        audit_store,
        email_server,
        api_client,
    }
}

impl TestApp {
    pub async fn post_subscribe(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw_subscribe(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe", self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_verify(&self, query: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/verify{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_unsubscribe(&self, query: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/unsubscribe{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn healthcheck(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/healthz", self.address))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Accepts every outgoing email.
    pub async fn mock_email_delivery(&self) {
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.email_server)
            .await;
    }

    pub fn get_verification_links(&self, email_request: &wiremock::Request) -> VerificationLinks {
        let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();

        let get_link = |s: &str| {
            let links: Vec<_> = linkify::LinkFinder::new()
                .links(s)
                .filter(|l| *l.kind() == linkify::LinkKind::Url)
                .collect();
            assert_eq!(links.len(), 1);
            let mut link = reqwest::Url::parse(links[0].as_str()).unwrap();
            assert_eq!(link.host_str().unwrap(), "127.0.0.1");
            link.set_port(Some(self.port)).unwrap();
            link
        };

        VerificationLinks {
            html: get_link(body["HtmlBody"].as_str().unwrap()),
            plain_text: get_link(body["TextBody"].as_str().unwrap()),
        }
    }

    /// Subscribes `email` and returns the token it was issued.
    pub async fn subscribe(&self, email: &str) -> String {
        self.mock_email_delivery().await;
        let response = self
            .post_subscribe(&serde_json::json!({ "email": email, "districts": ["D1"] }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        self.token_of(email)
    }

    pub fn row_of(&self, email: &str) -> Vec<String> {
        self.store
            .snapshot()
            .into_iter()
            .find(|row| Column::Email.read(row) == email)
            .expect("No row for this email")
    }

    pub fn token_of(&self, email: &str) -> String {
        Column::VerificationToken.read(&self.row_of(email)).to_string()
    }

    pub fn status_of(&self, email: &str) -> String {
        Column::Status.read(&self.row_of(email)).to_string()
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
