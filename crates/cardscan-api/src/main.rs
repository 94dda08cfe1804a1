use cardscan_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, pipeline, clients, routes)
    let (_state, router) = cardscan_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    cardscan_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
