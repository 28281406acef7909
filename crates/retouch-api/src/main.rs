use retouch_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, repositories, routes)
    let (_state, router) = retouch_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    retouch_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
