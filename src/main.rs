// --- SIRDS - servidor de la API ---

use sirds::{run_server, Config};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env();
    log::info!("=== SIRDS (API) ===");
    log::info!("base de datos: {}", config.db_url);
    run_server(config).await
}
