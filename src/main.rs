use std::net::SocketAddr;

use submission_dashboard::{
    config::{get_config, init_config},
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    if let Err(e) = init_config() {
        error!("{}. Please check your .env file.", e);
        return Err(e.into());
    }
    let config = get_config();
    config.log_summary();

    let app_state = AppState::from_config(config)?;
    info!("Supabase client created");

    info!("Serving static pages from: {}", config.public_dir);
    let app = routes::router(app_state, &config.public_dir);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server is running on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
