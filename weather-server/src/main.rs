use weather_server::{ServerConfig, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    init_tracing(&config.log_level);
    run(config).await
}
