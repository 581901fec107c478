use adminhub_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = AppConfig::from_env();
    adminhub_observability::init(loaded.config.log_format);
    loaded.log_warnings();

    let config = loaded.config;
    let addr = config.listen_addr;
    let app = adminhub_api::app::build_app(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
