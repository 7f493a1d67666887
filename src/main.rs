use alert_subscriptions::configuration::Settings;
use alert_subscriptions::startup::Application;
use alert_subscriptions::telemetry::{get_subscriber, init_subscriber};
use anyhow::Context;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber(
        "alert_subscriptions".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let config = Settings::get().context("Failed to read configuration.")?;
    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
