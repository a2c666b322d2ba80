use std::net::SocketAddr;

use flagrush::server::{self, AppState};
use flagrush::{AppResult, ServerConfig, World, WorldConfig};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    let world_config = WorldConfig::load_or_default(&config.world_config)?;
    let world = World::new(world_config, server::now_millis());

    let (commands, receiver) = mpsc::unbounded_channel();
    server::spawn_game_loop(world, config.tick_interval_ms(), receiver);

    let app = server::router(AppState { commands }, &config.public_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {}", addr);
    println!("open in browser: http://localhost:{}", config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
